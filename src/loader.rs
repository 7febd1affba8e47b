//! 写真読み込みモジュール
//!
//! ファイル選択側の制約（画像のみ）をここで適用する。
//! 形式は拡張子ではなく先頭バイトから判定する。

use crate::error::{AutoSafeError, Result};
use autosafe_common::ImageFile;
use sha2::{Digest, Sha256};
use std::path::Path;

/// パスから写真を読み込む
pub fn load_image(path: &Path) -> Result<ImageFile> {
    if !path.is_file() {
        return Err(AutoSafeError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    image_from_bytes(file_name, bytes)
}

/// バイト列から写真を組み立てる
pub fn image_from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<ImageFile> {
    let file_name = file_name.into();
    let mime_type = detect_mime_type(&bytes)
        .ok_or_else(|| AutoSafeError::NotAnImage(file_name.clone()))?;
    let digest = compute_digest(&bytes);

    Ok(ImageFile::new(file_name, mime_type, bytes, digest))
}

/// 先頭バイトから画像のMIMEタイプを判定
pub fn detect_mime_type(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    let mime = format.to_mime_type();
    mime.starts_with("image/").then_some(mime)
}

/// SHA-256（16進）
pub fn compute_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
