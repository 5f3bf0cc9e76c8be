//! 画像アップロード
//!
//! 画像をJPEG（品質80）に再エンコードし、`<nanoid>.jpeg` として送る。

use super::ApiClient;
use crate::error::{ReceiptScanError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use receipt_scan_common::UploadedFile;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use tracing::info;

pub(crate) const FILES_PATH: &str = "/api/files";
pub const JPEG_QUALITY: u8 = 80;

/// 画像ファイルをJPEGバイト列にする
pub fn encode_jpeg(path: &Path) -> Result<Vec<u8>> {
    let image = image::open(path)
        .map_err(|e| ReceiptScanError::ImageLoad(format!("{}: {}", path.display(), e)))?;

    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(image.to_rgb8())
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY))
        .map_err(|e| ReceiptScanError::ImageLoad(format!("JPEGエンコードエラー: {}", e)))?;
    Ok(buffer)
}

pub(crate) fn upload_file_name() -> String {
    format!("{}.jpeg", nanoid::nanoid!())
}

impl ApiClient {
    pub async fn upload_image(&self, path: &Path) -> Result<UploadedFile> {
        let bytes = encode_jpeg(path)?;
        let file_name = upload_file_name();
        info!(file = %file_name, bytes = bytes.len(), "画像アップロード");

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/jpeg")?;
        let form = Form::new().part("file", part);

        self.send(self.post(FILES_PATH).multipart(form)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.png");
        image::RgbaImage::new(16, 16).save(&path).unwrap();

        let bytes = encode_jpeg(&path).unwrap();
        // JPEG SOI
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_jpeg_missing_file() {
        let result = encode_jpeg(Path::new("/nonexistent/receipt.png"));
        assert!(matches!(result, Err(ReceiptScanError::ImageLoad(_))));
    }

    #[test]
    fn test_upload_file_name() {
        let a = upload_file_name();
        let b = upload_file_name();
        assert!(a.ends_with(".jpeg"));
        assert_ne!(a, b);
    }
}
