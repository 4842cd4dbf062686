//! # APIエラー型
//!
//! すべての失敗はHTTPステータスと `{"error": "<メッセージ>"}` のJSONボディに
//! 変換される。スタックトレースや秘密情報（APIキー、ミント秘密鍵）は
//! レスポンスに決して含めない。

use axum::http::StatusCode;
use axum::Json;

/// APIエラー型。
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// リクエスト内容の不備（必須フィールド欠落、画像サイズ超過等）
    #[error("{0}")]
    Validation(String),
    /// ウォレット署名の検証失敗
    #[error("{0}")]
    Auth(String),
    /// 対象リソースが存在しない
    #[error("{0}")]
    NotFound(String),
    /// 外部API（IPFSアップロード / PumpPortal）呼び出しの失敗
    #[error("{0}")]
    Upstream(String),
    /// 内部エラー
    #[error("{0}")]
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
