//! # マーケットデータプロキシエンドポイント
//!
//! DexScreenerとHelius RPCへの読み取り専用プロキシ。ベストエフォートの
//! 補助データなので、上流の失敗・タイムアウトは空の結果に置き換え、
//! 決して5xxを返さない。

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::config::AppState;

/// GET /api/dexscreener/{mintAddress} — ペア情報。失敗時は空のペア一覧。
pub async fn handle_pair_data(
    State(state): State<Arc<AppState>>,
    Path(mint_address): Path<String>,
) -> Json<serde_json::Value> {
    match state.market.pair_data(&mint_address).await {
        Ok(payload) => Json(payload),
        Err(e) => {
            tracing::warn!(
                error = %e,
                mint_address = %mint_address,
                "DexScreenerの取得に失敗しました"
            );
            Json(serde_json::json!({ "pairs": [] }))
        }
    }
}

/// GET /api/holders/{mintAddress} — 上位ホルダー。失敗時は空のホルダー一覧。
pub async fn handle_holders(
    State(state): State<Arc<AppState>>,
    Path(mint_address): Path<String>,
) -> Json<serde_json::Value> {
    match state.market.largest_holders(&mint_address).await {
        Ok(payload) => Json(payload),
        Err(e) => {
            tracing::warn!(
                error = %e,
                mint_address = %mint_address,
                "ホルダー情報の取得に失敗しました"
            );
            Json(serde_json::json!({ "result": { "value": [] } }))
        }
    }
}
