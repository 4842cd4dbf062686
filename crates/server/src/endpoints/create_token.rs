//! # POST /api/create-token
//!
//! multipartフォーム（画像 + テキストフィールド）を受け取り、署名検証、
//! バリデーション、画像のローカル保存、外部ミントシーケンス、レコード
//! 永続化までを行う。外部APIに触れるのは署名検証を通過した後だけ。

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;

use launchpad_types::{CreateTokenResponse, LaunchParams, TokenRecord, TokenStatus};

use crate::auth::verify_wallet_signature;
use crate::config::AppState;
use crate::error::ApiError;
use crate::portal::{Submission, TokenCreationRequest};
use crate::uploads;

/// multipartフォームから取り出した生の入力。
#[derive(Default)]
struct RawForm {
    wallet_address: Option<String>,
    signature: Option<String>,
    message: Option<String>,
    name: Option<String>,
    symbol: Option<String>,
    description: Option<String>,
    twitter: Option<String>,
    telegram: Option<String>,
    website: Option<String>,
    dev_buy_amount: Option<String>,
    slippage: Option<String>,
    priority_fee: Option<String>,
    /// (元ファイル名, バイト列)
    image: Option<(String, Vec<u8>)>,
}

/// multipartボディを読み切る。未知のフィールドは無視する。
async fn read_form(mut multipart: Multipart) -> Result<RawForm, ApiError> {
    let mut form = RawForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        if name == "image" {
            let filename = field.file_name().unwrap_or("image").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read image: {e}")))?;
            form.image = Some((filename, bytes.to_vec()));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::Validation(format!("Failed to read field {name}: {e}")))?;

        match name.as_str() {
            "walletAddress" => form.wallet_address = Some(value),
            "signature" => form.signature = Some(value),
            "message" => form.message = Some(value),
            "name" => form.name = Some(value),
            "symbol" => form.symbol = Some(value),
            "description" => form.description = Some(value),
            "twitter" => form.twitter = Some(value),
            "telegram" => form.telegram = Some(value),
            "website" => form.website = Some(value),
            "devBuyAmount" => form.dev_buy_amount = Some(value),
            "slippage" => form.slippage = Some(value),
            "priorityFee" => form.priority_fee = Some(value),
            _ => {}
        }
    }

    Ok(form)
}

/// 必須テキストフィールド。空白のみも欠落として扱う。
fn require_text(value: &Option<String>, field: &str) -> Result<String, ApiError> {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ApiError::Validation(format!(
            "Missing required field: {field}"
        ))),
    }
}

fn parse_f64(value: &Option<String>, default: f64, field: &str) -> Result<f64, ApiError> {
    match value.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => {
            let parsed: f64 = s
                .parse()
                .map_err(|_| ApiError::Validation(format!("Invalid numeric value for {field}")))?;
            if parsed < 0.0 {
                return Err(ApiError::Validation(format!(
                    "{field} must not be negative"
                )));
            }
            Ok(parsed)
        }
    }
}

fn parse_u32(value: &Option<String>, default: u32, field: &str) -> Result<u32, ApiError> {
    match value.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|_| ApiError::Validation(format!("Invalid numeric value for {field}"))),
    }
}

/// 数値パラメータを既定値つきでパースする。負値・非数値は400で拒否する。
fn parse_launch_params(form: &RawForm) -> Result<LaunchParams, ApiError> {
    let defaults = LaunchParams::default();
    Ok(LaunchParams {
        dev_buy_amount: parse_f64(&form.dev_buy_amount, defaults.dev_buy_amount, "devBuyAmount")?,
        slippage: parse_u32(&form.slippage, defaults.slippage, "slippage")?,
        priority_fee: parse_f64(&form.priority_fee, defaults.priority_fee, "priorityFee")?,
    })
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// POST /api/create-token — トークン作成。
///
/// 検証順序: ウォレット検証データの存在 → 署名検証 → 必須フィールド → 画像。
/// 署名検証を通過するまで外部APIには一切触れない。
pub async fn handle_create_token(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<CreateTokenResponse>, ApiError> {
    let form = read_form(multipart).await?;

    // ウォレット検証データ
    let (wallet_address, signature, message) =
        match (&form.wallet_address, &form.signature, &form.message) {
            (Some(w), Some(s), Some(m)) => (w.clone(), s.clone(), m.clone()),
            _ => {
                return Err(ApiError::Validation(
                    "Missing wallet verification data".to_string(),
                ))
            }
        };

    // 署名検証。失敗したらここで打ち切り、外部呼び出しは発生しない
    if !verify_wallet_signature(&wallet_address, &signature, &message) {
        tracing::warn!(wallet = %wallet_address, "ウォレット署名の検証に失敗しました");
        return Err(ApiError::Auth("Invalid wallet signature".to_string()));
    }

    let name = require_text(&form.name, "name")?;
    let symbol = require_text(&form.symbol, "symbol")?;
    let description = require_text(&form.description, "description")?;

    let (image_name, image_bytes) = match &form.image {
        Some((image_name, image_bytes)) => (image_name.clone(), image_bytes.clone()),
        None => return Err(ApiError::Validation("Token image is required".to_string())),
    };
    if image_bytes.is_empty() {
        return Err(ApiError::Validation("Token image is empty".to_string()));
    }
    if image_bytes.len() > state.config.max_image_size {
        return Err(ApiError::Validation(format!(
            "Token image exceeds the {} byte limit",
            state.config.max_image_size
        )));
    }

    let params = parse_launch_params(&form)?;

    // 画像のローカル保存。失敗しても作成処理は止めない（imageUrlがnullになるだけ）
    let image_url = match uploads::save_image(
        &state.config.uploads_dir,
        &state.config.public_base_url,
        &image_name,
        &image_bytes,
    )
    .await
    {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!(error = %e, "画像の保存に失敗しました");
            None
        }
    };

    let request = TokenCreationRequest {
        creator: wallet_address.clone(),
        name: name.clone(),
        symbol: symbol.clone(),
        description: description.clone(),
        twitter: optional_text(form.twitter),
        telegram: optional_text(form.telegram),
        website: optional_text(form.website),
        params,
    };

    let outcome = state
        .portal
        .create_token(&request, image_bytes, state.config.submission_mode)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "トークン作成に失敗しました");
            ApiError::Upstream(format!("Failed to prepare token: {e}"))
        })?;

    // Immediateは即確定、Deferredはクライアント署名待ち
    let (status, tx_signature, requires_signature, encoded_transaction) =
        match outcome.submission {
            Submission::Submitted { signature } => {
                (TokenStatus::Confirmed, Some(signature), None, None)
            }
            Submission::RequiresSignature {
                encoded_transaction,
            } => (
                TokenStatus::Pending,
                None,
                Some(true),
                Some(encoded_transaction),
            ),
        };

    let now = Utc::now();
    let token = TokenRecord {
        mint_address: outcome.mint_address.clone(),
        name,
        symbol,
        description,
        image_url,
        metadata_uri: Some(outcome.metadata_uri),
        creator: wallet_address,
        twitter: request.twitter.clone(),
        telegram: request.telegram.clone(),
        website: request.website.clone(),
        dev_buy_amount: params.dev_buy_amount,
        slippage: params.slippage,
        priority_fee: params.priority_fee,
        pump_fun_url: format!("https://pump.fun/{}", outcome.mint_address),
        solscan_url: format!("https://solscan.io/token/{}", outcome.mint_address),
        status,
        signature: tx_signature.clone(),
        transaction_url: tx_signature
            .as_ref()
            .map(|sig| format!("https://solscan.io/tx/{sig}")),
        created_at: now,
        confirmed_at: (status == TokenStatus::Confirmed).then_some(now),
    };

    // ミント自体は上流で成功しているため、保存失敗はログに留めて成功を返す
    if let Err(e) = state.store.insert(&token).await {
        tracing::warn!(
            error = %e,
            mint_address = %token.mint_address,
            "トークンレコードの保存に失敗しました"
        );
    }

    tracing::info!(
        mint_address = %token.mint_address,
        status = token.status.as_str(),
        "トークンを作成しました"
    );

    Ok(Json(CreateTokenResponse {
        success: true,
        token,
        requires_signature,
        encoded_transaction,
    }))
}
