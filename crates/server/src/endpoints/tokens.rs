//! # トークン照会エンドポイント
//!
//! 一覧（新しい順）とミントアドレスによる1件照会。

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use launchpad_types::{TokenResponse, TokensResponse};

use crate::config::AppState;
use crate::error::ApiError;
use crate::extract::ApiQuery;

/// 一覧の既定件数
const DEFAULT_LIST_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct TokensQuery {
    pub limit: Option<usize>,
}

/// GET /api/tokens — 新しい順の一覧。
/// ストア障害時は空の一覧になる（このエンドポイントは決して5xxを返さない）。
pub async fn handle_list_tokens(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<TokensQuery>,
) -> Json<TokensResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let tokens = state.store.list(limit).await;
    Json(TokensResponse { tokens })
}

/// GET /api/tokens/{mintAddress} — 1件照会。存在しなければ404。
pub async fn handle_get_token(
    State(state): State<Arc<AppState>>,
    Path(mint_address): Path<String>,
) -> Result<Json<TokenResponse>, ApiError> {
    match state.store.get(&mint_address).await {
        Ok(Some(token)) => Ok(Json(TokenResponse { token })),
        Ok(None) => Err(ApiError::NotFound("Token not found".to_string())),
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}
