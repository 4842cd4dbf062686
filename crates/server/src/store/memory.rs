//! # メモリ上のトークンストア
//!
//! MongoDBが使えない環境向けの揮発フォールバック。プロセス再起動で
//! データが消える。順序・検索のセマンティクスはMongoStoreと同一に保つ。

use chrono::Utc;
use tokio::sync::RwLock;

use launchpad_types::{TokenRecord, TokenStatus};

use super::{StoreError, TokenStore};

/// プロセス内のトークンストア。追記は`RwLock`で直列化する。
pub struct MemoryStore {
    tokens: RwLock<Vec<TokenRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryStore {
    async fn insert(&self, record: &TokenRecord) -> Result<(), StoreError> {
        self.tokens.write().await.push(record.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        mint_address: &str,
        status: TokenStatus,
        signature: &str,
    ) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().await;
        match tokens.iter_mut().find(|t| t.mint_address == mint_address) {
            Some(token) => {
                token.status = status;
                token.signature = Some(signature.to_string());
                token.transaction_url = Some(format!("https://solscan.io/tx/{signature}"));
                token.confirmed_at = Some(Utc::now());
                Ok(())
            }
            None => Err(StoreError::NotFound(mint_address.to_string())),
        }
    }

    async fn get(&self, mint_address: &str) -> Result<Option<TokenRecord>, StoreError> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .iter()
            .find(|t| t.mint_address == mint_address)
            .cloned())
    }

    async fn list(&self, limit: usize) -> Vec<TokenRecord> {
        let tokens = self.tokens.read().await;
        let mut sorted: Vec<TokenRecord> = tokens.clone();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sorted.truncate(limit);
        sorted
    }
}
