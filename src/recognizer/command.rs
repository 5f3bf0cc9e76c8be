//! 外部OCRコマンド連携
//!
//! 設定されたプログラムを画像パス付きで起動し、標準出力のJSONを読む。

use super::{check_image, fragments_from_output, CoordinateOrigin, RecognitionError, TextRecognizer};
use crate::config::RecognizerConfig;
use async_trait::async_trait;
use receipt_scan_common::TextFragment;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error};

const IMAGE_PLACEHOLDER: &str = "{image}";

#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
    origin: CoordinateOrigin,
    min_confidence: f64,
    timeout: Duration,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            origin: CoordinateOrigin::BottomLeft,
            min_confidence: 0.0,
            timeout,
        }
    }

    pub fn from_config(config: &RecognizerConfig, timeout: Duration) -> Self {
        Self::new(config.program.clone(), config.args.clone(), timeout)
            .with_origin(config.origin)
            .with_min_confidence(config.min_confidence)
    }

    pub fn with_origin(mut self, origin: CoordinateOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// 引数の `{image}` を置換（無ければ末尾に追加）
    fn build_args(&self, image: &Path) -> Vec<String> {
        let image_arg = image.display().to_string();
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace(IMAGE_PLACEHOLDER, &image_arg))
            .collect();
        if !self.args.iter().any(|a| a.contains(IMAGE_PLACEHOLDER)) {
            args.push(image_arg);
        }
        args
    }
}

#[async_trait]
impl TextRecognizer for CommandRecognizer {
    async fn recognize(&self, image: &Path) -> Result<Vec<TextFragment>, RecognitionError> {
        let (width, height) = check_image(image)?;
        let args = self.build_args(image);
        debug!(program = %self.program, ?args, width, height, "認識コマンド起動");

        let child = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| RecognitionError::Timeout(self.timeout))?
            .map_err(|e| RecognitionError::Launch {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(code = ?output.status.code(), stderr = %stderr, "認識コマンド失敗");
            return Err(RecognitionError::Failed {
                code: output.status.code(),
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(stdout_len = stdout.len(), "認識コマンド完了");

        fragments_from_output(&stdout, self.origin, self.min_confidence)
    }
}
