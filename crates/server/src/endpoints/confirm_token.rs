//! # POST /api/confirm-token
//!
//! Deferredモードでクライアントが署名・送信を終えた後の確定報告。
//! レコードを `pending` から `confirmed` に遷移させる。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use launchpad_types::{ConfirmTokenRequest, ConfirmTokenResponse, TokenStatus};

use crate::config::AppState;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::store::StoreError;

/// POST /api/confirm-token — `(mintAddress, signature)` で確定を記録する。
/// 未知のミントアドレスは404。新規レコードは決して作らない。
pub async fn handle_confirm_token(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ConfirmTokenRequest>,
) -> Result<Json<ConfirmTokenResponse>, ApiError> {
    let (mint_address, signature) = match (&body.mint_address, &body.signature) {
        (Some(m), Some(s)) if !m.is_empty() && !s.is_empty() => (m.as_str(), s.as_str()),
        _ => {
            return Err(ApiError::Validation(
                "Missing required fields".to_string(),
            ))
        }
    };

    match state
        .store
        .update_status(mint_address, TokenStatus::Confirmed, signature)
        .await
    {
        Ok(()) => {
            tracing::info!(mint_address = %mint_address, "トークンを確定しました");
            Ok(Json(ConfirmTokenResponse { success: true }))
        }
        Err(StoreError::NotFound(_)) => Err(ApiError::NotFound("Token not found".to_string())),
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}
