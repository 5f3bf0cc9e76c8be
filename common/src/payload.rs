//! 抽出バックエンドへの送信ペイロード

use crate::rows::Row;
use serde::{Deserialize, Serialize};

/// 行を文字列の2次元配列に変換（色・矩形は落とす）
pub fn rows_to_strings(rows: &[Row]) -> Vec<Vec<String>> {
    rows.iter().map(Row::texts).collect()
}

/// `POST /api/files/process/text-extract` のリクエストボディ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTextRequest {
    pub extracted_text: Vec<Vec<String>>,
}

impl ExtractedTextRequest {
    pub fn from_rows(rows: &[Row]) -> Self {
        Self {
            extracted_text: rows_to_strings(rows),
        }
    }
}
