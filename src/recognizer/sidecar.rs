//! サイドカーJSONからの読み込み
//!
//! `receipt.jpg` に対して同じフォルダの `receipt.jpg.ocr.json` を読む。
//! 認識済みデータの再生やオフライン作業に使う。

use super::{check_image, fragments_from_output, CoordinateOrigin, RecognitionError, TextRecognizer};
use async_trait::async_trait;
use receipt_scan_common::TextFragment;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SIDECAR_SUFFIX: &str = ".ocr.json";

#[derive(Debug, Clone, Default)]
pub struct SidecarRecognizer {
    origin: CoordinateOrigin,
    min_confidence: f64,
}

impl SidecarRecognizer {
    pub fn new(origin: CoordinateOrigin, min_confidence: f64) -> Self {
        Self { origin, min_confidence }
    }

    pub fn sidecar_path(image: &Path) -> PathBuf {
        let mut name = image
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(SIDECAR_SUFFIX);
        image.with_file_name(name)
    }
}

#[async_trait]
impl TextRecognizer for SidecarRecognizer {
    async fn recognize(&self, image: &Path) -> Result<Vec<TextFragment>, RecognitionError> {
        check_image(image)?;

        let path = Self::sidecar_path(image);
        debug!(path = %path.display(), "サイドカー読み込み");

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| RecognitionError::Output(format!("{}: {}", path.display(), e)))?;

        fragments_from_output(&content, self.origin, self.min_confidence)
    }
}
