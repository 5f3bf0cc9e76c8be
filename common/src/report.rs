//! スキャン結果レポート
//!
//! `scan` の出力JSON。`export` と `submit` の入力にもなる。

use crate::invoice::{Invoice, UploadedFile};
use crate::payload::rows_to_strings;
use crate::rows::Row;
use serde::{Deserialize, Serialize};

/// 画像1枚分の結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub file_name: String,

    /// 撮影日時（EXIF）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,

    #[serde(default)]
    pub rows: Vec<Row>,

    /// 補正で捨てた断片数
    #[serde(default)]
    pub dropped: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded: Option<UploadedFile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice: Option<Invoice>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ScanReport {
    pub fn extracted_text(&self) -> Vec<Vec<String>> {
        rows_to_strings(&self.rows)
    }

    pub fn fragment_count(&self) -> usize {
        self.rows.iter().map(Row::len).sum()
    }
}

/// 失敗した画像
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanFailure {
    pub file_name: String,
    pub message: String,
}

/// バッチ全体の結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub reports: Vec<ScanReport>,

    #[serde(default)]
    pub failures: Vec<ScanFailure>,
}

impl BatchReport {
    pub fn invoices(&self) -> impl Iterator<Item = &Invoice> {
        self.reports.iter().filter_map(|r| r.invoice.as_ref())
    }
}
