//! # ウォレット署名検証
//!
//! トークン作成リクエストが主張どおりのウォレットから発行されたことを
//! Ed25519署名で確認する。これが他人のウォレットを騙ったトークン作成を
//! 防ぐ唯一のゲートであり、コストの高い外部API呼び出し（IPFSアップロード、
//! ミント）より前に必ず実行する。

use base58::FromBase58;
use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

/// Base64エンジン（Standard）
pub(crate) fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// デコードと検証の本体。どこかで失敗したらNoneを返す。
fn decode_and_verify(wallet_address: &str, signature_b64: &str, message_b64: &str) -> Option<()> {
    let pubkey_bytes = wallet_address.from_base58().ok()?;
    let pubkey: [u8; 32] = pubkey_bytes.as_slice().try_into().ok()?;
    let verifying_key = VerifyingKey::from_bytes(&pubkey).ok()?;

    let signature_bytes = b64().decode(signature_b64).ok()?;
    let signature: [u8; 64] = signature_bytes.as_slice().try_into().ok()?;
    let signature = Signature::from_bytes(&signature);

    let message = b64().decode(message_b64).ok()?;

    verifying_key.verify(&message, &signature).ok()
}

/// ウォレット署名を検証する。
///
/// - `wallet_address`: Base58エンコードされたEd25519公開鍵
/// - `signature_b64`: Base64エンコードされた署名（64バイト）
/// - `message_b64`: Base64エンコードされた署名対象メッセージ
///
/// 不正なBase58/Base64、鍵長の不一致を含むあらゆる失敗はfalseとして扱う
/// （fail-closed）。パニックは起こさない。
pub fn verify_wallet_signature(
    wallet_address: &str,
    signature_b64: &str,
    message_b64: &str,
) -> bool {
    decode_and_verify(wallet_address, signature_b64, message_b64).is_some()
}
