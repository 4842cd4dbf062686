//! # Launchpad バックエンドサーバー
//!
//! Solana向けトークンローンチWebアプリのバックエンド。
//!
//! ## 役割
//! - ウォレット署名の検証（Ed25519）
//! - トークンメタデータのIPFSアップロード
//! - PumpPortal経由のトークンミント（immediate / deferredの2モード）
//! - 作成済みトークンの永続化と照会（MongoDB / メモリ）
//! - マーケットデータ（DexScreener / Helius）の読み取りプロキシ
//!
//! ## APIエンドポイント
//! - `GET  /api/health` — 死活確認
//! - `POST /api/create-token` — トークン作成（multipart）
//! - `POST /api/confirm-token` — クライアント署名後の確定報告
//! - `GET  /api/tokens` — 新しい順の一覧
//! - `GET  /api/tokens/{mintAddress}` — 1件照会
//! - `GET  /api/dexscreener/{mintAddress}` — ペア情報プロキシ
//! - `GET  /api/holders/{mintAddress}` — 上位ホルダープロキシ
//! - `/uploads/*` — 保存済み画像の静的配信

mod auth;
mod config;
mod endpoints;
mod error;
mod extract;
mod market;
mod portal;
mod store;
mod uploads;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::config::AppState;

/// multipartボディ全体の上限。画像上限（5 MiB）+ テキストフィールド分の余裕
const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// CORSレイヤーを構築する。許可オリジン未設定なら全許可（開発用）。
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// APIルーターを構築する。
pub fn router(state: Arc<AppState>) -> axum::Router {
    let uploads_dir = state.config.uploads_dir.clone();
    let cors = cors_layer(&state.config.allowed_origins);

    axum::Router::new()
        .route("/api/health", axum::routing::get(endpoints::handle_health))
        .route(
            "/api/create-token",
            axum::routing::post(endpoints::handle_create_token),
        )
        .route(
            "/api/confirm-token",
            axum::routing::post(endpoints::handle_confirm_token),
        )
        .route(
            "/api/tokens",
            axum::routing::get(endpoints::handle_list_tokens),
        )
        .route(
            "/api/tokens/{mint_address}",
            axum::routing::get(endpoints::handle_get_token),
        )
        .route(
            "/api/dexscreener/{mint_address}",
            axum::routing::get(endpoints::handle_pair_data),
        )
        .route(
            "/api/holders/{mint_address}",
            axum::routing::get(endpoints::handle_holders),
        )
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .fallback(endpoints::handle_not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env();
    tokio::fs::create_dir_all(&config.uploads_dir).await?;

    // ストアは起動時に一度だけ選択し、以後はハンドラに注入された
    // トレイトオブジェクト経由でのみ使う
    let (store, storage_mode) = store::init_store(config.mongodb_uri.as_deref()).await;
    tracing::info!(storage_mode, "ストレージを初期化しました");

    let portal = portal::PumpPortalClient::new(
        config.pumpportal_url.clone(),
        config.pumpfun_ipfs_url.clone(),
        config.pumpportal_api_key.clone(),
    )?;
    let market = market::MarketClient::new(
        config.dexscreener_url.clone(),
        config.helius_rpc_url.clone(),
    )?;

    let addr = format!("0.0.0.0:{}", config.port);
    let submission_mode = config.submission_mode;

    let state = Arc::new(AppState {
        config,
        store,
        storage_mode,
        portal,
        market,
    });

    let app = router(state);

    tracing::info!(
        addr = %addr,
        submission_mode = submission_mode.as_str(),
        "Launchpadバックエンドを起動します"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
