//! # MongoDBトークンストア
//!
//! `tokens` コレクションに1トークン1ドキュメントで保存する。
//! 時刻はマイクロ秒固定精度のRFC 3339文字列で保存するため、createdAtの
//! 文字列降順ソートがそのまま時系列降順になる。

use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};

use launchpad_types::{TokenRecord, TokenStatus};

use super::{StoreError, TokenStore};

/// 接続確立時のサーバー選択タイムアウト
const SERVER_SELECTION_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// MongoDBによるトークンストア実装。
pub struct MongoStore {
    tokens: Collection<TokenRecord>,
}

impl MongoStore {
    /// 接続し、pingで到達性を確認してから構築する。
    /// 到達できないURIで黙って起動しないため、失敗は呼び出し側で
    /// メモリストアへのフォールバックに使う。
    pub async fn connect(uri: &str) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(uri).await?;
        options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);

        let client = Client::with_options(options)?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        let db = client
            .default_database()
            .unwrap_or_else(|| client.database("launchpad"));

        Ok(Self {
            tokens: db.collection::<TokenRecord>("tokens"),
        })
    }
}

#[async_trait::async_trait]
impl TokenStore for MongoStore {
    async fn insert(&self, record: &TokenRecord) -> Result<(), StoreError> {
        self.tokens
            .insert_one(record)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn update_status(
        &self,
        mint_address: &str,
        status: TokenStatus,
        signature: &str,
    ) -> Result<(), StoreError> {
        let update = doc! {
            "$set": {
                "status": status.as_str(),
                "signature": signature,
                "transactionUrl": format!("https://solscan.io/tx/{signature}"),
                "confirmedAt": launchpad_types::rfc3339_micros::to_string(&Utc::now()),
            }
        };

        let result = self
            .tokens
            .update_one(doc! { "mintAddress": mint_address }, update)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound(mint_address.to_string()));
        }
        Ok(())
    }

    async fn get(&self, mint_address: &str) -> Result<Option<TokenRecord>, StoreError> {
        self.tokens
            .find_one(doc! { "mintAddress": mint_address })
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn list(&self, limit: usize) -> Vec<TokenRecord> {
        // MongoDBのlimit(0)は「無制限」なので、0件要求はクエリせずに返す。
        // メモリストアのtruncate(0)と同じ結果になる
        if limit == 0 {
            return Vec::new();
        }

        let cursor = match self
            .tokens
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await
        {
            Ok(cursor) => cursor,
            Err(e) => {
                tracing::warn!(error = %e, "トークン一覧のクエリに失敗しました");
                return Vec::new();
            }
        };

        match cursor.try_collect().await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "トークン一覧の読み取りに失敗しました");
                Vec::new()
            }
        }
    }
}
