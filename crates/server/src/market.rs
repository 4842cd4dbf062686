//! # マーケットデータクライアント
//!
//! DexScreenerとHelius RPCへの読み取り専用フォワーダ。ベストエフォートの
//! 補助データであり、失敗はエンドポイント層で空の結果に置き換える。
//! ページ表示を決してブロックしない。

use std::time::Duration;

/// マーケットデータ読み取りクライアント。
///
/// ベースURLを注入できるため、テストではモックサーバーに差し替えられる。
pub struct MarketClient {
    http: reqwest::Client,
    dexscreener_url: String,
    helius_rpc_url: String,
}

impl MarketClient {
    /// 5秒タイムアウトのHTTPクライアントで構築する。
    pub fn new(dexscreener_url: String, helius_rpc_url: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            http,
            dexscreener_url,
            helius_rpc_url,
        })
    }

    /// DexScreenerからペア情報（価格・出来高・流動性）を取得する。
    pub async fn pair_data(&self, mint_address: &str) -> anyhow::Result<serde_json::Value> {
        let url = format!(
            "{}/latest/dex/tokens/{}",
            self.dexscreener_url, mint_address
        );
        let payload = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(payload)
    }

    /// Helius RPCの getTokenLargestAccounts で上位ホルダーを取得する。
    pub async fn largest_holders(&self, mint_address: &str) -> anyhow::Result<serde_json::Value> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getTokenLargestAccounts",
            "params": [mint_address],
        });
        let payload = self
            .http
            .post(&self.helius_rpc_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;

    async fn start_mock(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        format!("http://127.0.0.1:{port}")
    }

    /// DexScreener応答がそのまま返ることを確認
    #[tokio::test]
    async fn test_pair_data_passthrough() {
        let app = axum::Router::new().route(
            "/latest/dex/tokens/{mint}",
            axum::routing::get(|| async {
                Json(serde_json::json!({ "pairs": [{ "priceUsd": "0.001" }] }))
            }),
        );
        let base = start_mock(app).await;

        let client = MarketClient::new(base.clone(), base).unwrap();
        let payload = client.pair_data("Mint123").await.unwrap();
        assert_eq!(payload["pairs"][0]["priceUsd"], "0.001");
    }

    /// Helius RPC応答がそのまま返ることを確認
    #[tokio::test]
    async fn test_largest_holders_passthrough() {
        let app = axum::Router::new().route(
            "/",
            axum::routing::post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["method"], "getTokenLargestAccounts");
                Json(serde_json::json!({
                    "result": { "value": [{ "address": "Holder1", "amount": "1000" }] }
                }))
            }),
        );
        let base = start_mock(app).await;

        let client = MarketClient::new(base.clone(), format!("{base}/")).unwrap();
        let payload = client.largest_holders("Mint123").await.unwrap();
        assert_eq!(payload["result"]["value"][0]["address"], "Holder1");
    }

    /// 上流の5xxがエラーとして伝わることを確認（空結果への変換は上位層の責務）
    #[tokio::test]
    async fn test_upstream_error_propagates() {
        let app = axum::Router::new().route(
            "/latest/dex/tokens/{mint}",
            axum::routing::get(|| async {
                (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "down")
            }),
        );
        let base = start_mock(app).await;

        let client = MarketClient::new(base.clone(), base).unwrap();
        assert!(client.pair_data("Mint123").await.is_err());
    }
}
