//! # PumpPortalクライアント / トークン作成オーケストレータ
//!
//! トークン作成は次の3段階を厳密な順序で実行する。各段階は自動リトライせず、
//! 失敗した時点で残りを中断する。
//! 1. 画像とメタデータをIPFSへアップロードし `metadataUri` を得る
//! 2. ミント用キーペアを生成する（公開鍵がそのままミントアドレスになる）
//! 3. PumpPortalの trade / trade-local へ作成リクエストを送る
//!
//! 送信モードは `SubmissionMode` で一本化する。モードごとに別サービスを
//! 複製しない。

use base64::Engine;
use solana_sdk::signer::keypair::Keypair;
use solana_sdk::signer::Signer;

use launchpad_types::LaunchParams;

use crate::auth::b64;

/// ミント送信モード。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
    /// 即時送信。PumpPortalがサーバー側で署名・送信し、tx署名を同期的に返す
    Immediate,
    /// 遅延送信。未署名txを返し、クライアントが署名・送信後に
    /// POST /api/confirm-token で確定を報告する
    Deferred,
}

impl SubmissionMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "immediate" => Some(SubmissionMode::Immediate),
            "deferred" => Some(SubmissionMode::Deferred),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionMode::Immediate => "immediate",
            SubmissionMode::Deferred => "deferred",
        }
    }
}

/// トークン作成エラー型。上位層でHTTP 500に変換される。
/// メッセージには上流のステータス・ボディを含めるが、APIキーや
/// ミント秘密鍵は決して含めない。
#[derive(Debug, thiserror::Error)]
pub enum CreationError {
    /// IPFSメタデータアップロードの失敗
    #[error("metadata upload failed: {0}")]
    MetadataUpload(String),
    /// PumpPortal trade / trade-local 呼び出しの失敗
    #[error("trade API call failed: {0}")]
    TradeApi(String),
}

/// トークン作成の入力。HTTP層でバリデーション済みの値のみを受け取る。
#[derive(Debug, Clone)]
pub struct TokenCreationRequest {
    /// 作成者ウォレットアドレス（Base58）。署名検証済み
    pub creator: String,
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub website: Option<String>,
    pub params: LaunchParams,
}

/// trade呼び出しの結果。モードごとに形が異なり、混在しない。
#[derive(Debug)]
pub enum Submission {
    /// Immediate: 送信済みトランザクションの署名
    Submitted { signature: String },
    /// Deferred: クライアントが署名すべきエンコード済みトランザクション（Base64）
    RequiresSignature { encoded_transaction: String },
}

/// ミント要求全体の結果。
#[derive(Debug)]
pub struct MintOutcome {
    /// 生成したキーペアの公開鍵（Base58）
    pub mint_address: String,
    pub metadata_uri: String,
    pub submission: Submission,
}

/// PumpPortal / pump.fun IPFSのHTTPクライアント。
///
/// ベースURLを注入できるため、テストではモックサーバーに差し替えられる。
pub struct PumpPortalClient {
    http: reqwest::Client,
    api_key: String,
    portal_url: String,
    ipfs_url: String,
}

impl PumpPortalClient {
    /// 60秒タイムアウトのHTTPクライアントで構築する。
    /// ミントは上流での処理が重く、読み取り系より長いタイムアウトを取る。
    pub fn new(portal_url: String, ipfs_url: String, api_key: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            api_key,
            portal_url,
            ipfs_url,
        })
    }

    /// トークン作成を実行する。
    pub async fn create_token(
        &self,
        request: &TokenCreationRequest,
        image: Vec<u8>,
        mode: SubmissionMode,
    ) -> Result<MintOutcome, CreationError> {
        // Step 1: メタデータアップロード
        let metadata_uri = self.upload_metadata(request, image).await?;
        tracing::info!(metadata_uri = %metadata_uri, "メタデータをアップロードしました");

        // Step 2: ミント用キーペア生成。OSのCSPRNGを使う。
        // 秘密鍵を握る者が作成中のミントを支配するため、再利用も予測も許されない
        let mint_keypair = Keypair::new();
        let mint_address = mint_keypair.pubkey().to_string();
        tracing::info!(mint_address = %mint_address, "ミント用キーペアを生成しました");

        // Step 3: PumpPortalへ作成リクエスト。
        // 秘密鍵は上流がミントに共同署名するために渡す
        let payload = serde_json::json!({
            "publicKey": request.creator,
            "action": "create",
            "tokenMetadata": {
                "name": request.name,
                "symbol": request.symbol,
                "uri": metadata_uri,
            },
            "mint": mint_keypair.to_base58_string(),
            "denominatedInSol": "true",
            "amount": request.params.dev_buy_amount,
            "slippage": request.params.slippage,
            "priorityFee": request.params.priority_fee,
            "pool": "pump",
            "isMayhemMode": "true",
        });

        let submission = match mode {
            SubmissionMode::Immediate => self.submit_trade(&payload).await?,
            SubmissionMode::Deferred => self.prepare_trade(&payload).await?,
        };

        Ok(MintOutcome {
            mint_address,
            metadata_uri,
            submission,
        })
    }

    /// 画像とテキストメタデータをIPFSへアップロードし、metadataUriを返す。
    async fn upload_metadata(
        &self,
        request: &TokenCreationRequest,
        image: Vec<u8>,
    ) -> Result<String, CreationError> {
        let part = reqwest::multipart::Part::bytes(image)
            .file_name("token.png")
            .mime_str("image/png")
            .map_err(|e| CreationError::MetadataUpload(format!("invalid image part: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("name", request.name.clone())
            .text("symbol", request.symbol.clone())
            .text("description", request.description.clone())
            .text("twitter", request.twitter.clone().unwrap_or_default())
            .text("telegram", request.telegram.clone().unwrap_or_default())
            .text("website", request.website.clone().unwrap_or_default())
            .text("showName", "true");

        let response = self
            .http
            .post(&self.ipfs_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CreationError::MetadataUpload(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CreationError::MetadataUpload(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(CreationError::MetadataUpload(format!(
                "HTTP {status} - {body}"
            )));
        }

        let json: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| CreationError::MetadataUpload(format!("invalid response JSON: {e}")))?;

        json.get("metadataUri")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                CreationError::MetadataUpload("response missing metadataUri".to_string())
            })
    }

    /// trade: 上流がサーバー側で署名・送信し、tx署名を返す。
    async fn submit_trade(
        &self,
        payload: &serde_json::Value,
    ) -> Result<Submission, CreationError> {
        let url = format!("{}/api/trade?api-key={}", self.portal_url, self.api_key);
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| CreationError::TradeApi(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CreationError::TradeApi(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(CreationError::TradeApi(format!("HTTP {status} - {body}")));
        }

        let json: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| CreationError::TradeApi(format!("invalid response JSON: {e}")))?;

        // PumpPortalは200でも {"errors": [...]} を返すことがある
        if let Some(errors) = json.get("errors").and_then(|v| v.as_array()) {
            if !errors.is_empty() {
                return Err(CreationError::TradeApi(
                    serde_json::Value::Array(errors.clone()).to_string(),
                ));
            }
        }

        match json.get("signature").and_then(|v| v.as_str()) {
            Some(signature) => Ok(Submission::Submitted {
                signature: signature.to_string(),
            }),
            None => Err(CreationError::TradeApi(
                "response missing signature".to_string(),
            )),
        }
    }

    /// trade-local: 未署名トランザクションのバイト列を受け取り、Base64で返す。
    async fn prepare_trade(
        &self,
        payload: &serde_json::Value,
    ) -> Result<Submission, CreationError> {
        let url = format!(
            "{}/api/trade-local?api-key={}",
            self.portal_url, self.api_key
        );
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| CreationError::TradeApi(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CreationError::TradeApi(format!("HTTP {status} - {body}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CreationError::TradeApi(format!("failed to read response: {e}")))?;

        Ok(Submission::RequiresSignature {
            encoded_transaction: b64().encode(&bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;

    fn test_request() -> TokenCreationRequest {
        TokenCreationRequest {
            creator: "11111111111111111111111111111112".to_string(),
            name: "Demo".to_string(),
            symbol: "DEMO".to_string(),
            description: "test".to_string(),
            twitter: None,
            telegram: None,
            website: None,
            params: LaunchParams::default(),
        }
    }

    /// モックの上流サーバー（IPFS + PumpPortal）を起動し、ベースURLを返す
    async fn start_mock_upstream(trade_response: axum::Router) -> String {
        let app = axum::Router::new()
            .route(
                "/api/ipfs",
                axum::routing::post(|| async {
                    Json(serde_json::json!({ "metadataUri": "ipfs://test-metadata" }))
                }),
            )
            .merge(trade_response);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        format!("http://127.0.0.1:{port}")
    }

    fn client_for(base: &str) -> PumpPortalClient {
        PumpPortalClient::new(
            base.to_string(),
            format!("{base}/api/ipfs"),
            "test-key".to_string(),
        )
        .unwrap()
    }

    /// Immediateモード: trade応答の署名がSubmittedとして返ることを確認
    #[tokio::test]
    async fn test_create_token_immediate() {
        let trade = axum::Router::new().route(
            "/api/trade",
            axum::routing::post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["action"], "create");
                assert_eq!(body["pool"], "pump");
                assert_eq!(body["isMayhemMode"], "true");
                assert!(body["mint"].as_str().is_some_and(|s| !s.is_empty()));
                Json(serde_json::json!({ "signature": "sig123" }))
            }),
        );
        let base = start_mock_upstream(trade).await;

        let outcome = client_for(&base)
            .create_token(&test_request(), b"png".to_vec(), SubmissionMode::Immediate)
            .await
            .unwrap();

        assert!(!outcome.mint_address.is_empty());
        assert_eq!(outcome.metadata_uri, "ipfs://test-metadata");
        match outcome.submission {
            Submission::Submitted { signature } => assert_eq!(signature, "sig123"),
            other => panic!("unexpected submission: {other:?}"),
        }
    }

    /// Deferredモード: trade-local応答のバイト列がBase64で返ることを確認
    #[tokio::test]
    async fn test_create_token_deferred() {
        let trade = axum::Router::new().route(
            "/api/trade-local",
            axum::routing::post(|| async { b"rawtxbytes".to_vec() }),
        );
        let base = start_mock_upstream(trade).await;

        let outcome = client_for(&base)
            .create_token(&test_request(), b"png".to_vec(), SubmissionMode::Deferred)
            .await
            .unwrap();

        match outcome.submission {
            Submission::RequiresSignature {
                encoded_transaction,
            } => assert_eq!(encoded_transaction, b64().encode(b"rawtxbytes")),
            other => panic!("unexpected submission: {other:?}"),
        }
    }

    /// tradeのHTTPエラーがTradeApiとして返ることを確認
    #[tokio::test]
    async fn test_trade_http_error() {
        let trade = axum::Router::new().route(
            "/api/trade",
            axum::routing::post(|| async {
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "upstream exploded",
                )
            }),
        );
        let base = start_mock_upstream(trade).await;

        let result = client_for(&base)
            .create_token(&test_request(), b"png".to_vec(), SubmissionMode::Immediate)
            .await;

        match result {
            Err(CreationError::TradeApi(message)) => {
                assert!(message.contains("500"));
                assert!(message.contains("upstream exploded"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    /// trade応答の errors フィールドがエラー扱いになることを確認
    #[tokio::test]
    async fn test_trade_errors_field() {
        let trade = axum::Router::new().route(
            "/api/trade",
            axum::routing::post(|| async {
                Json(serde_json::json!({ "errors": ["insufficient balance"] }))
            }),
        );
        let base = start_mock_upstream(trade).await;

        let result = client_for(&base)
            .create_token(&test_request(), b"png".to_vec(), SubmissionMode::Immediate)
            .await;

        match result {
            Err(CreationError::TradeApi(message)) => {
                assert!(message.contains("insufficient balance"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    /// IPFSアップロード失敗時にtradeが呼ばれずMetadataUploadが返ることを確認
    #[tokio::test]
    async fn test_metadata_upload_failure_aborts() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let trade_hits = Arc::new(AtomicUsize::new(0));
        let hits = trade_hits.clone();

        let app = axum::Router::new()
            .route(
                "/api/ipfs",
                axum::routing::post(|| async {
                    (axum::http::StatusCode::BAD_GATEWAY, "ipfs down")
                }),
            )
            .route(
                "/api/trade",
                axum::routing::post(move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Json(serde_json::json!({ "signature": "sig" }))
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let base = format!("http://127.0.0.1:{port}");
        let result = client_for(&base)
            .create_token(&test_request(), b"png".to_vec(), SubmissionMode::Immediate)
            .await;

        assert!(matches!(result, Err(CreationError::MetadataUpload(_))));
        assert_eq!(trade_hits.load(Ordering::SeqCst), 0, "tradeが呼ばれてしまった");
    }

    /// 生成されるミントアドレスが毎回異なることを確認
    #[tokio::test]
    async fn test_mint_address_is_fresh() {
        let trade = axum::Router::new().route(
            "/api/trade-local",
            axum::routing::post(|| async { b"tx".to_vec() }),
        );
        let base = start_mock_upstream(trade).await;
        let client = client_for(&base);

        let first = client
            .create_token(&test_request(), b"png".to_vec(), SubmissionMode::Deferred)
            .await
            .unwrap();
        let second = client
            .create_token(&test_request(), b"png".to_vec(), SubmissionMode::Deferred)
            .await
            .unwrap();

        assert_ne!(first.mint_address, second.mint_address);
    }
}
