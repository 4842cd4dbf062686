//! # サーバー設定・共有状態
//!
//! 環境変数からの設定読み込みとサーバーの共有状態の定義。
//! 設定は起動時に一度だけ読み込み、`AppState` として全ハンドラに注入する。
//! 遅延バインドのグローバル状態は使わない。

use std::path::PathBuf;

use crate::market::MarketClient;
use crate::portal::{PumpPortalClient, SubmissionMode};
use crate::store::TokenStore;

/// 画像サイズ上限（5 MiB）
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// 環境変数から読み込むサーバー設定。
#[derive(Debug, Clone)]
pub struct Config {
    /// 待ち受けポート
    pub port: u16,
    /// MongoDB接続文字列。未設定ならメモリストアを使う
    pub mongodb_uri: Option<String>,
    /// PumpPortal APIキー
    pub pumpportal_api_key: String,
    /// PumpPortalのベースURL
    pub pumpportal_url: String,
    /// pump.fun IPFSアップロードエンドポイント
    pub pumpfun_ipfs_url: String,
    /// DexScreenerのベースURL
    pub dexscreener_url: String,
    /// Helius RPCエンドポイント
    pub helius_rpc_url: String,
    /// 画像リンク生成に使う外部公開ベースURL
    pub public_base_url: String,
    /// アップロード画像の保存先ディレクトリ
    pub uploads_dir: PathBuf,
    /// ミント送信モード
    pub submission_mode: SubmissionMode,
    /// CORSで許可するオリジン。空なら全許可
    pub allowed_origins: Vec<String>,
    /// 画像サイズ上限（バイト）
    pub max_image_size: usize,
}

impl Config {
    /// 環境変数から設定を読み込む。未設定の項目は開発用の既定値を使う。
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3001);

        let mongodb_uri = std::env::var("MONGODB_URI").ok().filter(|s| !s.is_empty());

        let pumpportal_api_key = std::env::var("PUMPPORTAL_API_KEY").unwrap_or_default();
        if pumpportal_api_key.is_empty() {
            tracing::warn!("PUMPPORTAL_API_KEYが未設定です。ミント呼び出しは失敗します");
        }

        let pumpportal_url = std::env::var("PUMPPORTAL_URL")
            .unwrap_or_else(|_| "https://pumpportal.fun".to_string());
        let pumpfun_ipfs_url = std::env::var("PUMPFUN_IPFS_URL")
            .unwrap_or_else(|_| "https://pump.fun/api/ipfs".to_string());
        let dexscreener_url = std::env::var("DEXSCREENER_URL")
            .unwrap_or_else(|_| "https://api.dexscreener.com".to_string());
        let helius_rpc_url = std::env::var("HELIUS_RPC_URL")
            .unwrap_or_else(|_| "https://mainnet.helius-rpc.com".to_string());
        let public_base_url =
            std::env::var("API_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));

        let submission_mode = match std::env::var("SUBMISSION_MODE").ok() {
            None => SubmissionMode::Deferred,
            Some(value) => match SubmissionMode::parse(&value) {
                Some(mode) => mode,
                None => {
                    tracing::warn!(
                        value = %value,
                        "不明なSUBMISSION_MODEです。deferredを使用します"
                    );
                    SubmissionMode::Deferred
                }
            },
        };

        let uploads_dir =
            PathBuf::from(std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()));

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|value| {
                value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            port,
            mongodb_uri,
            pumpportal_api_key,
            pumpportal_url,
            pumpfun_ipfs_url,
            dexscreener_url,
            helius_rpc_url,
            public_base_url,
            uploads_dir,
            submission_mode,
            allowed_origins,
            max_image_size: MAX_IMAGE_SIZE,
        }
    }
}

/// サーバーの共有状態。起動時に一度だけ構築し、`Arc`で全ハンドラに共有する。
pub struct AppState {
    pub config: Config,
    /// トークンストア（MongoDB / メモリ、トレイトで抽象化）
    pub store: Box<dyn TokenStore>,
    /// ストアの種別（ヘルスチェック用）: "mongodb" | "in-memory"
    pub storage_mode: &'static str,
    /// PumpPortal / IPFSクライアント
    pub portal: PumpPortalClient,
    /// マーケットデータ読み取りクライアント
    pub market: MarketClient,
}
