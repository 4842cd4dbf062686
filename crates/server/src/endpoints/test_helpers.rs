//! # エンドポイントテスト用ヘルパー
//!
//! モックの上流サーバー（IPFS / PumpPortal / DexScreener / Helius）と
//! アプリ本体をループバックの空きポートで起動する。

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::Json;
use base58::ToBase58;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};

use crate::auth::b64;
use crate::config::{AppState, Config, MAX_IMAGE_SIZE};
use crate::market::MarketClient;
use crate::portal::{PumpPortalClient, SubmissionMode};
use crate::store::memory::MemoryStore;

/// モック上流への到達回数。「外部呼び出しが発生しない」ことの検証に使う。
#[derive(Clone)]
pub struct UpstreamHits {
    ipfs: Arc<AtomicUsize>,
    trade: Arc<AtomicUsize>,
}

impl UpstreamHits {
    fn new() -> Self {
        Self {
            ipfs: Arc::new(AtomicUsize::new(0)),
            trade: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn ipfs(&self) -> usize {
        self.ipfs.load(Ordering::SeqCst)
    }

    pub fn trade(&self) -> usize {
        self.trade.load(Ordering::SeqCst)
    }
}

async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    format!("http://127.0.0.1:{port}")
}

/// 正常系のモックPumpPortal一式を起動する。
pub async fn start_mock_portal() -> (String, UpstreamHits) {
    let hits = UpstreamHits::new();

    let ipfs_hits = hits.ipfs.clone();
    let trade_hits = hits.trade.clone();
    let trade_local_hits = hits.trade.clone();

    let app = axum::Router::new()
        .route(
            "/api/ipfs",
            axum::routing::post(move || {
                let ipfs_hits = ipfs_hits.clone();
                async move {
                    ipfs_hits.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({ "metadataUri": "ipfs://test-metadata" }))
                }
            }),
        )
        .route(
            "/api/trade",
            axum::routing::post(move || {
                let trade_hits = trade_hits.clone();
                async move {
                    trade_hits.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({ "signature": "sig123" }))
                }
            }),
        )
        .route(
            "/api/trade-local",
            axum::routing::post(move || {
                let trade_local_hits = trade_local_hits.clone();
                async move {
                    trade_local_hits.fetch_add(1, Ordering::SeqCst);
                    b"unsigned-tx-bytes".to_vec()
                }
            }),
        );

    (serve(app).await, hits)
}

/// IPFSが常に落ちているモック上流を起動する。
pub async fn start_failing_portal() -> (String, UpstreamHits) {
    let hits = UpstreamHits::new();

    let app = axum::Router::new().route(
        "/api/ipfs",
        axum::routing::post(|| async {
            (axum::http::StatusCode::BAD_GATEWAY, "ipfs down")
        }),
    );

    (serve(app).await, hits)
}

/// メモリストアとモック上流向き設定のAppStateを構築する。
pub fn test_state(portal_base: &str, uploads_dir: &Path, mode: SubmissionMode) -> Arc<AppState> {
    let config = Config {
        port: 0,
        mongodb_uri: None,
        pumpportal_api_key: "test-key".to_string(),
        pumpportal_url: portal_base.to_string(),
        pumpfun_ipfs_url: format!("{portal_base}/api/ipfs"),
        dexscreener_url: portal_base.to_string(),
        helius_rpc_url: format!("{portal_base}/rpc"),
        public_base_url: "http://localhost:3001".to_string(),
        uploads_dir: uploads_dir.to_path_buf(),
        submission_mode: mode,
        allowed_origins: Vec::new(),
        max_image_size: MAX_IMAGE_SIZE,
    };

    let portal = PumpPortalClient::new(
        config.pumpportal_url.clone(),
        config.pumpfun_ipfs_url.clone(),
        config.pumpportal_api_key.clone(),
    )
    .unwrap();
    let market = MarketClient::new(
        config.dexscreener_url.clone(),
        config.helius_rpc_url.clone(),
    )
    .unwrap();

    Arc::new(AppState {
        config,
        store: Box::new(MemoryStore::new()),
        storage_mode: "in-memory",
        portal,
        market,
    })
}

/// アプリ本体のルーターをループバックで起動し、ベースURLを返す。
pub async fn start_app(state: Arc<AppState>) -> String {
    serve(crate::router(state)).await
}

/// 新しいキーペアでメッセージに署名し、(ウォレット, 署名B64, メッセージB64) を返す。
pub fn signed_wallet(message: &[u8]) -> (String, String, String) {
    let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
    let wallet = signing_key.verifying_key().to_bytes().to_base58();
    let signature = b64().encode(signing_key.sign(message).to_bytes());
    (wallet, signature, b64().encode(message))
}

/// 画像つきの有効なトークン作成フォームを組み立てる。
pub fn token_form(wallet: &str, signature: &str, message: &str) -> reqwest::multipart::Form {
    token_form_without_image(wallet, signature, message).part(
        "image",
        reqwest::multipart::Part::bytes(b"fake-png-bytes".to_vec())
            .file_name("logo.png")
            .mime_str("image/png")
            .unwrap(),
    )
}

/// 画像を含まないトークン作成フォーム。
pub fn token_form_without_image(
    wallet: &str,
    signature: &str,
    message: &str,
) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("walletAddress", wallet.to_string())
        .text("signature", signature.to_string())
        .text("message", message.to_string())
        .text("name", "Demo")
        .text("symbol", "DEMO")
        .text("description", "test")
}
