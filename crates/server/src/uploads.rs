//! # アップロード画像の保存
//!
//! 受信した画像をローカルの公開ディレクトリに保存し、`/uploads/<ファイル名>` で
//! 配信できるようにする。ファイル名はUNIXミリ秒を前置したサニタイズ済みの
//! 元ファイル名。

use std::path::Path;

use chrono::Utc;

/// ファイル名を安全な形式に変換する。英数字と `.` 以外はすべて `_` に置換する。
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .collect()
}

/// 画像をアップロードディレクトリに保存し、公開URLを返す。
pub async fn save_image(
    uploads_dir: &Path,
    public_base_url: &str,
    original_name: &str,
    bytes: &[u8],
) -> anyhow::Result<String> {
    let filename = format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        sanitize_filename(original_name)
    );
    let path = uploads_dir.join(&filename);
    tokio::fs::write(&path, bytes).await?;

    Ok(format!(
        "{}/uploads/{}",
        public_base_url.trim_end_matches('/'),
        filename
    ))
}
