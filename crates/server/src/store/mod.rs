//! # トークンストア
//!
//! 永続ストア（MongoDB）とプロセス内メモリの2実装をトレイトで抽象化する。
//! 起動時に一度だけ選択してハンドラに注入し、以後はトレイトオブジェクト
//! 経由でのみ触る。呼び出し側から見た順序（createdAt降順）と検索の
//! セマンティクスは両実装で同一。

pub mod memory;
pub mod mongo;

use launchpad_types::{TokenRecord, TokenStatus};

/// ストアのエラー型。
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 指定されたミントアドレスのレコードが存在しない
    #[error("token not found: {0}")]
    NotFound(String),
    /// バックエンドストアの障害
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// トークンストアの抽象インターフェース。
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// レコードを保存する。
    async fn insert(&self, record: &TokenRecord) -> Result<(), StoreError>;

    /// ステータス遷移と署名の記録。確定時刻とトランザクションURLも併せて
    /// 設定する。未知のミントアドレスにはNotFoundを返し、新規レコードは
    /// 決して作らない。
    async fn update_status(
        &self,
        mint_address: &str,
        status: TokenStatus,
        signature: &str,
    ) -> Result<(), StoreError>;

    /// ミントアドレスでレコードを1件引く。
    async fn get(&self, mint_address: &str) -> Result<Option<TokenRecord>, StoreError>;

    /// 新しい順に最大limit件を返す。バックエンド障害時は空列を返す
    /// （一覧表示は決して失敗させない）。
    async fn list(&self, limit: usize) -> Vec<TokenRecord>;
}

/// 起動時のストア選択。
///
/// MONGODB_URIがあれば接続とpingを試み、失敗したら警告を出してメモリストアに
/// フォールバックする。メモリストアのデータはプロセス再起動で失われる
/// （既知の制限）。
pub async fn init_store(mongodb_uri: Option<&str>) -> (Box<dyn TokenStore>, &'static str) {
    if let Some(uri) = mongodb_uri {
        match mongo::MongoStore::connect(uri).await {
            Ok(store) => {
                tracing::info!("MongoDBに接続しました");
                return (Box::new(store), "mongodb");
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "MongoDB接続に失敗しました。メモリストアにフォールバックします"
                );
            }
        }
    } else {
        tracing::info!("MONGODB_URI未設定のためメモリストアを使用します");
    }
    (Box::new(memory::MemoryStore::new()), "in-memory")
}
