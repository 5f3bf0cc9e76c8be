use crate::error::{ReceiptScanError, Result};
use crate::recognizer::CoordinateOrigin;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const TOKEN_ENV: &str = "RECEIPT_SCAN_API_TOKEN";
pub const HOST_ENV: &str = "RECEIPT_SCAN_API_HOST";

/// OCRコマンドの設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub program: String,
    /// `{image}` は画像パスに置換される
    pub args: Vec<String>,
    pub origin: CoordinateOrigin,
    pub min_confidence: f64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            program: "receipt-ocr".into(),
            args: vec!["{image}".into(), "--json".into()],
            origin: CoordinateOrigin::BottomLeft,
            min_confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_host: String,
    pub access_token: Option<String>,
    pub timeout_seconds: u64,
    pub color_tolerance: f64,
    pub live_interval_ms: u64,
    pub recognizer: RecognizerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_host: "http://localhost:3000".into(),
            access_token: None,
            timeout_seconds: 60,
            color_tolerance: receipt_scan_common::DEFAULT_TOLERANCE,
            live_interval_ms: 200,
            recognizer: RecognizerConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ReceiptScanError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("receipt-scan").join("config.json"))
    }

    /// 接続先ホスト（環境変数を優先、末尾の `/` は除く）
    pub fn api_host(&self) -> String {
        let host = std::env::var(HOST_ENV)
            .ok()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| self.api_host.clone());
        host.trim().trim_end_matches('/').to_string()
    }

    /// アクセストークン（環境変数を優先）
    pub fn access_token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.access_token.clone())
    }

    pub fn require_access_token(&self) -> Result<String> {
        self.access_token().ok_or(ReceiptScanError::MissingApiToken)
    }

    pub fn set_access_token(&mut self, token: String) -> Result<()> {
        self.access_token = Some(token);
        self.save()
    }

    pub fn set_api_host(&mut self, host: String) -> Result<()> {
        self.api_host = host;
        self.save()
    }
}
