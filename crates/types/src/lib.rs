//! # Launchpad 共有型定義
//!
//! バックエンドAPIが扱うデータ構造をRust構造体として提供する。
//! ワイヤ表現はすべてcamelCaseのJSON。
//!
//! ## エンコーディング規則
//! - Base58: Solanaアドレス、ミントアドレス（人間が読みやすく、紛らわしい文字を除外）
//! - Base64: ウォレット署名、署名対象メッセージ、未署名トランザクション

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 時刻のワイヤ表現
// ---------------------------------------------------------------------------

/// 時刻をマイクロ秒固定精度のRFC 3339文字列として読み書きするserdeモジュール。
///
/// 精度を固定しないと秒以下の桁数が値ごとに変わり（`…11.5Z` と `…11.250Z` 等）、
/// 文字列の辞書順ソートが時系列順と一致しなくなる。MongoStoreはcreatedAtの
/// 文字列降順ソートに依存しているため、桁数を固定する。
pub mod rfc3339_micros {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn to_string(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&to_string(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    /// `Option<DateTime<Utc>>` 版。
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => super::serialize(dt, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<String>::deserialize(d)?;
            raw.map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
        }
    }
}

// ---------------------------------------------------------------------------
// トークンレコード
// ---------------------------------------------------------------------------

/// トークンのステータス。
/// `pending`（クライアント署名待ち）から `confirmed`（確定）への一方向遷移のみで、
/// 逆方向には決して戻らない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    Pending,
    Confirmed,
}

impl TokenStatus {
    /// ワイヤ表現と同じ小文字の文字列を返す。
    pub fn as_str(self) -> &'static str {
        match self {
            TokenStatus::Pending => "pending",
            TokenStatus::Confirmed => "confirmed",
        }
    }
}

/// ローンチ時の数値パラメータ。フォームで省略された場合は既定値を使う。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchParams {
    /// 作成者による初回買い付け量（SOL建て）
    pub dev_buy_amount: f64,
    /// スリッページ許容値（パーセント）
    pub slippage: u32,
    /// 優先手数料（SOL建て）
    pub priority_fee: f64,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            dev_buy_amount: 0.0,
            slippage: 10,
            priority_fee: 0.0005,
        }
    }
}

/// 作成されたトークン1件のレコード。
///
/// ミントアドレスは作成時に一度だけ割り当てられ、以後変化しない。
/// レコードを削除するAPIは存在しない。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// ミントアドレス（Base58公開鍵）。一覧・照会のキー
    pub mint_address: String,
    pub name: String,
    pub symbol: String,
    pub description: String,
    /// ローカル保存した画像の公開URL（保存に失敗した場合はnull）
    pub image_url: Option<String>,
    /// IPFSへアップロードしたメタデータJSONのURI
    pub metadata_uri: Option<String>,
    /// 作成者ウォレットアドレス（Base58）
    pub creator: String,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub website: Option<String>,
    /// 作成者による初回買い付け量（SOL建て）
    pub dev_buy_amount: f64,
    /// スリッページ許容値（パーセント）
    pub slippage: u32,
    /// 優先手数料（SOL建て）
    pub priority_fee: f64,
    /// pump.fun のトークンページURL
    pub pump_fun_url: String,
    /// Solscan のトークンページURL
    pub solscan_url: String,
    pub status: TokenStatus,
    /// 確定済みトランザクションの署名（pendingの間はnull）
    pub signature: Option<String>,
    /// Solscan のトランザクションページURL（確定後に設定）
    pub transaction_url: Option<String>,
    #[serde(with = "rfc3339_micros")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "rfc3339_micros::option")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// リクエスト / レスポンス
// ---------------------------------------------------------------------------

/// GET /api/health のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    /// RFC 3339形式の現在時刻
    pub timestamp: String,
    /// "mongodb" または "in-memory"
    pub storage_mode: String,
    /// "immediate" または "deferred"
    pub submission_mode: String,
}

/// POST /api/create-token のレスポンス。
///
/// Deferredモードのときのみ `requiresSignature` と `encodedTransaction` が
/// 含まれる。モードごとのレスポンス形は混在しない。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenResponse {
    pub success: bool,
    pub token: TokenRecord,
    /// Deferredモード: クライアントによる署名が必要であることを示す
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_signature: Option<bool>,
    /// Deferredモード: クライアントが署名すべきトランザクション（Base64）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_transaction: Option<String>,
}

/// POST /api/confirm-token のリクエスト。
/// フィールド欠落を422ではなく400で返すため、各フィールドはOptionで受ける。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmTokenRequest {
    pub mint_address: Option<String>,
    /// クライアントが送信したトランザクションの署名
    pub signature: Option<String>,
}

/// POST /api/confirm-token のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmTokenResponse {
    pub success: bool,
}

/// GET /api/tokens のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensResponse {
    pub tokens: Vec<TokenRecord>,
}

/// GET /api/tokens/{mintAddress} のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: TokenRecord,
}
