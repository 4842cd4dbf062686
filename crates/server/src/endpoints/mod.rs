//! # APIエンドポイント
//!
//! 1ハンドラ1ファイル。バリデーションと署名検証はこの層で行い、
//! 検証を通過したリクエストだけがオーケストレータとストアに届く。

pub mod confirm_token;
pub mod create_token;
pub mod health;
pub mod market;
pub mod tokens;

#[cfg(test)]
pub mod test_helpers;

pub use confirm_token::handle_confirm_token;
pub use create_token::handle_create_token;
pub use health::handle_health;
pub use market::{handle_holders, handle_pair_data};
pub use tokens::{handle_get_token, handle_list_tokens};

use crate::error::ApiError;

/// 未定義ルートのフォールバック。
pub async fn handle_not_found() -> ApiError {
    ApiError::NotFound("Endpoint not found".to_string())
}
