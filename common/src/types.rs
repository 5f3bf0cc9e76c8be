//! OCR断片の型定義
//!
//! CLIとライブスキャンで共有される型:
//! - NormalizedRect: 正規化座標の矩形（原点は左下、Yは上向き）
//! - TextFragment: 認識された文字列1件とその矩形
//! - ColorTag: 同じ高さ帯の断片をまとめる表示色

use serde::{Deserialize, Serialize};

/// 正規化座標（0.0-1.0）の矩形
///
/// 原点は画像の左下で、Yが大きいほど画像の上側になる。
/// 画面座標へ変換する際は `screen_y = 1 - y` とする。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRect {
    #[serde(alias = "x")]
    pub min_x: f64,
    #[serde(alias = "y")]
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    pub fn new(min_x: f64, min_y: f64, width: f64, height: f64) -> Self {
        Self { min_x, min_y, width, height }
    }

    pub fn max_x(&self) -> f64 {
        self.min_x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.min_y + self.height
    }

    pub fn mid_x(&self) -> f64 {
        self.min_x + self.width / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        self.min_y + self.height / 2.0
    }

    /// 全座標が有限値か
    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }

    /// 上下反転（左下原点 ⇔ 左上原点）
    pub fn flip_vertical(&self) -> Self {
        Self {
            min_x: self.min_x,
            min_y: 1.0 - self.max_y(),
            width: self.width,
            height: self.height,
        }
    }

    /// 画面座標（左上原点、ピクセル）の矩形 `(x, y, w, h)` に変換
    pub fn to_screen(&self, screen_width: f64, screen_height: f64) -> (f64, f64, f64, f64) {
        let top_left = self.flip_vertical();
        (
            top_left.min_x * screen_width,
            top_left.min_y * screen_height,
            self.width * screen_width,
            self.height * screen_height,
        )
    }
}

/// 断片の識別子（UI差分用、内容とは無関係）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentId(String);

impl FragmentId {
    pub fn new() -> Self {
        Self(nanoid::nanoid!())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FragmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FragmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 表示色（固定パレット）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Red,
    Green,
    Blue,
    Orange,
    Purple,
    Cyan,
}

/// パレット順。使い切ったら先頭に戻る
pub const PALETTE: [ColorTag; 6] = [
    ColorTag::Red,
    ColorTag::Green,
    ColorTag::Blue,
    ColorTag::Orange,
    ColorTag::Purple,
    ColorTag::Cyan,
];

impl ColorTag {
    /// パレット番号から色を取得（剰余で循環）
    pub fn from_index(index: usize) -> Self {
        PALETTE[index % PALETTE.len()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorTag::Red => "red",
            ColorTag::Green => "green",
            ColorTag::Blue => "blue",
            ColorTag::Orange => "orange",
            ColorTag::Purple => "purple",
            ColorTag::Cyan => "cyan",
        }
    }

    /// Excelセル背景用の淡いRGB
    pub fn rgb(&self) -> u32 {
        match self {
            ColorTag::Red => 0xF8D0D0,
            ColorTag::Green => 0xD0F0D0,
            ColorTag::Blue => 0xD0DCF8,
            ColorTag::Orange => 0xFCE4C8,
            ColorTag::Purple => 0xE4D4F4,
            ColorTag::Cyan => 0xCCF0F4,
        }
    }
}

impl std::fmt::Display for ColorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 認識された文字列1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFragment {
    #[serde(default)]
    pub id: FragmentId,

    #[serde(default)]
    pub text: String,

    pub bounds: NormalizedRect,

    /// 色分け結果（assign_colors で設定）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorTag>,

    /// 認識信頼度（0.0-1.0）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, bounds: NormalizedRect) -> Self {
        Self {
            id: FragmentId::new(),
            text: text.into(),
            bounds,
            color: None,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_derived_values() {
        let rect = NormalizedRect::new(0.25, 0.5, 0.5, 0.25);
        assert_eq!(rect.max_x(), 0.75);
        assert_eq!(rect.max_y(), 0.75);
        assert_eq!(rect.mid_x(), 0.5);
        assert_eq!(rect.mid_y(), 0.625);
    }

    #[test]
    fn test_flip_vertical() {
        // 左下原点で上端0.75 → 左上原点で上端0.25
        let rect = NormalizedRect::new(0.0, 0.5, 0.5, 0.25);
        let flipped = rect.flip_vertical();
        assert_eq!(flipped.min_y, 0.25);
        assert_eq!(flipped.height, 0.25);
        assert_eq!(flipped.flip_vertical(), rect);
    }

    #[test]
    fn test_to_screen() {
        let rect = NormalizedRect::new(0.5, 0.5, 0.25, 0.25);
        let (x, y, w, h) = rect.to_screen(400.0, 800.0);
        assert_eq!(x, 200.0);
        assert_eq!(y, 200.0);
        assert_eq!(w, 100.0);
        assert_eq!(h, 200.0);
    }

    #[test]
    fn test_rect_accepts_xy_alias() {
        let rect: NormalizedRect =
            serde_json::from_str(r#"{"x": 0.1, "y": 0.2, "width": 0.3, "height": 0.4}"#).unwrap();
        assert_eq!(rect.min_x, 0.1);
        assert_eq!(rect.min_y, 0.2);
    }

    #[test]
    fn test_color_from_index_wraps() {
        assert_eq!(ColorTag::from_index(0), ColorTag::Red);
        assert_eq!(ColorTag::from_index(5), ColorTag::Cyan);
        assert_eq!(ColorTag::from_index(6), ColorTag::Red);
        assert_eq!(ColorTag::from_index(13), ColorTag::Green);
    }

    #[test]
    fn test_fragment_ids_are_unique() {
        let a = TextFragment::new("a", NormalizedRect::default());
        let b = TextFragment::new("a", NormalizedRect::default());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_fragment_deserialize_generates_id() {
        let json = r#"{"text": "TOTAL", "bounds": {"minX": 0.1, "minY": 0.2, "width": 0.3, "height": 0.05}}"#;
        let fragment: TextFragment = serde_json::from_str(json).unwrap();
        assert!(!fragment.id.as_str().is_empty());
        assert_eq!(fragment.text, "TOTAL");
        assert!(fragment.color.is_none());
    }
}
