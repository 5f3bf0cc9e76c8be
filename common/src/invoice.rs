//! 請求書・明細のワイヤ型
//!
//! バックエンドのJSONそのままのフィールド名（`_id`, `totalAmount`,
//! `creation_date` など）でシリアライズする。

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// RFC 3339（小数秒あり・なし両対応）の日時をパース
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim()).ok()
}

/// 表示用の日付（例: "Jan 10, 2026"）。パースできなければ "N/A"
pub fn display_date(value: &str) -> String {
    match parse_timestamp(value) {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => "N/A".to_string(),
    }
}

/// 税
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tax {
    pub tax_name: String,
    pub amount: f64,
}

/// 明細
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub price: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(default)]
    pub files: Vec<String>,

    #[serde(default)]
    pub date: String,

    #[serde(rename = "creation_date", default)]
    pub creation_date: String,

    #[serde(default)]
    pub creator: String,

    #[serde(default)]
    pub archived: bool,
}

impl Item {
    /// 数量（未指定は1）
    pub fn effective_quantity(&self) -> f64 {
        self.quantity.unwrap_or(1.0)
    }

    pub fn line_total(&self) -> f64 {
        self.price * self.effective_quantity()
    }

    pub fn display_date(&self) -> String {
        display_date(&self.date)
    }
}

/// 請求書
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,

    #[serde(default)]
    pub file: String,

    #[serde(default)]
    pub files: Vec<String>,

    #[serde(default)]
    pub items: Vec<Item>,

    #[serde(default)]
    pub total_amount: f64,

    #[serde(default)]
    pub taxes: Vec<Tax>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(default)]
    pub date: String,

    #[serde(rename = "creation_date", default)]
    pub creation_date: String,

    #[serde(default)]
    pub creator: String,

    #[serde(default)]
    pub archived: bool,
}

impl Invoice {
    pub fn date_time(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.date)
    }

    pub fn creation_date_time(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.creation_date)
    }

    pub fn display_date(&self) -> String {
        display_date(&self.date)
    }

    /// 明細小計（単価×数量の合計）
    pub fn items_subtotal(&self) -> f64 {
        self.items.iter().map(Item::line_total).sum()
    }

    pub fn taxes_total(&self) -> f64 {
        self.taxes.iter().map(|t| t.amount).sum()
    }

    /// 小計＋税
    pub fn calculated_total(&self) -> f64 {
        self.items_subtotal() + self.taxes_total()
    }

    /// 表示名（名前→取引先→ID の順に採用）
    pub fn title(&self) -> &str {
        self.name
            .as_deref()
            .or(self.vendor.as_deref())
            .or(self.id.as_deref())
            .unwrap_or("(無題)")
    }
}

/// テキスト抽出のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextExtractResponse {
    pub invoice: Invoice,
    #[serde(default)]
    pub message: String,
}

/// 請求書更新のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceEnvelope {
    pub invoice: Invoice,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// アップロード済みファイル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// 削除のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub ok: Option<bool>,
}
