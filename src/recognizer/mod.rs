//! 文字認識アダプタ
//!
//! 画像1枚から TextFragment の列を返す非同期の能力。
//! - CommandRecognizer: 外部OCRコマンドを実行しJSON出力を読む
//! - SidecarRecognizer: 画像の隣の `<画像名>.ocr.json` を読む
//! - StaticRecognizer: 固定の断片列を返す（テスト用）

mod command;
mod sidecar;

pub use command::CommandRecognizer;
pub use sidecar::SidecarRecognizer;

use async_trait::async_trait;
use clap::ValueEnum;
use receipt_scan_common::TextFragment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// 認識失敗（再試行可能。バッチは続行する）
#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("画素データを読み取れません ({path}): {reason}")]
    ImageDecode { path: String, reason: String },

    #[error("認識コマンドを起動できません ({program}): {reason}")]
    Launch { program: String, reason: String },

    #[error("認識コマンドが失敗しました (code {code:?}): {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("認識がタイムアウトしました ({0:?})")]
    Timeout(Duration),

    #[error("認識結果を解釈できません: {0}")]
    Output(String),
}

/// 認識プログラムが出力する座標の原点
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoordinateOrigin {
    /// 左下原点・Y上向き（そのまま使う）
    #[default]
    BottomLeft,
    /// 左上原点・Y下向き（上下反転する）
    TopLeft,
}

/// 認識アダプタの選択
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RecognizerKind {
    /// 外部OCRコマンド
    #[default]
    Command,
    /// `<画像名>.ocr.json` を読む
    Sidecar,
}

impl std::fmt::Display for RecognizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognizerKind::Command => write!(f, "command"),
            RecognizerKind::Sidecar => write!(f, "sidecar"),
        }
    }
}

#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &Path) -> Result<Vec<TextFragment>, RecognitionError>;
}

/// 画像ヘッダーを読めるか確認し、寸法を返す
pub fn check_image(image: &Path) -> Result<(u32, u32), RecognitionError> {
    image::image_dimensions(image).map_err(|e| RecognitionError::ImageDecode {
        path: image.display().to_string(),
        reason: e.to_string(),
    })
}

/// 認識プログラムの出力を断片列にする（原点変換・信頼度フィルタ）
pub(crate) fn fragments_from_output(
    output: &str,
    origin: CoordinateOrigin,
    min_confidence: f64,
) -> Result<Vec<TextFragment>, RecognitionError> {
    let fragments = receipt_scan_common::parse_observations(output)
        .map_err(|e| RecognitionError::Output(e.to_string()))?;

    Ok(fragments
        .into_iter()
        .filter(|f| f.confidence.map_or(true, |c| c >= min_confidence))
        .map(|mut f| {
            if origin == CoordinateOrigin::TopLeft {
                f.bounds = f.bounds.flip_vertical();
            }
            f
        })
        .collect())
}

/// 固定の断片列を返す
#[derive(Debug, Clone, Default)]
pub struct StaticRecognizer {
    fragments: Vec<TextFragment>,
}

impl StaticRecognizer {
    pub fn new(fragments: Vec<TextFragment>) -> Self {
        Self { fragments }
    }
}

#[async_trait]
impl TextRecognizer for StaticRecognizer {
    async fn recognize(&self, _image: &Path) -> Result<Vec<TextFragment>, RecognitionError> {
        // 呼び出しごとに新しいIDを振る
        Ok(self
            .fragments
            .iter()
            .map(|f| TextFragment {
                id: Default::default(),
                ..f.clone()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use receipt_scan_common::NormalizedRect;

    const OUTPUT: &str = r#"[
        {"text": "Widget", "bounds": {"x": 0.1, "y": 0.1, "width": 0.3, "height": 0.05}, "confidence": 0.9},
        {"text": "smudge", "bounds": {"x": 0.5, "y": 0.5, "width": 0.1, "height": 0.05}, "confidence": 0.2},
        {"text": "$9.99", "bounds": {"x": 0.6, "y": 0.1, "width": 0.15, "height": 0.05}}
    ]"#;

    #[test]
    fn test_output_bottom_left_kept() {
        let fragments = fragments_from_output(OUTPUT, CoordinateOrigin::BottomLeft, 0.0).unwrap();
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0].bounds.min_y, 0.1);
    }

    #[test]
    fn test_output_top_left_flipped() {
        let fragments = fragments_from_output(OUTPUT, CoordinateOrigin::TopLeft, 0.0).unwrap();
        // 上から0.1〜0.15 → 左下原点で0.85〜0.9
        assert!((fragments[0].bounds.min_y - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_min_confidence_filter() {
        let fragments = fragments_from_output(OUTPUT, CoordinateOrigin::BottomLeft, 0.5).unwrap();
        let texts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
        // 信頼度なしは残す
        assert_eq!(texts, vec!["Widget", "$9.99"]);
    }

    #[test]
    fn test_output_garbage() {
        let result = fragments_from_output("Segmentation fault", CoordinateOrigin::BottomLeft, 0.0);
        assert!(matches!(result, Err(RecognitionError::Output(_))));
    }

    #[test]
    fn test_check_image_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(check_image(&path), Err(RecognitionError::ImageDecode { .. })));
    }

    #[test]
    fn test_check_image_accepts_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.png");
        image::RgbImage::new(8, 4).save(&path).unwrap();
        assert_eq!(check_image(&path).unwrap(), (8, 4));
    }

    #[tokio::test]
    async fn test_static_recognizer_fresh_ids() {
        let recognizer = StaticRecognizer::new(vec![TextFragment::new(
            "TOTAL",
            NormalizedRect::new(0.1, 0.1, 0.2, 0.05),
        )]);
        let first = recognizer.recognize(Path::new("a.jpg")).await.unwrap();
        let second = recognizer.recognize(Path::new("a.jpg")).await.unwrap();
        assert_eq!(first[0].text, second[0].text);
        assert_ne!(first[0].id, second[0].id);
    }
}
