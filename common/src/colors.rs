//! 高さ帯ごとの色分け
//!
//! 到着順の断片に対して、min_y と高さがほぼ同じ「帯」に同じ色を割り当てる。
//! 最初に一致した帯を採用（first-fit）し、一致しなければ新しい帯を作って
//! パレットの次の色を使う。帯の状態は呼び出しごとに新規に作る。

use crate::types::{ColorTag, TextFragment, PALETTE};

/// 帯の一致判定に使う許容差（正規化座標）
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// 既知の帯
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorBand {
    pub min_y: f64,
    pub height: f64,
    pub color: ColorTag,
}

/// 色分けの状態（1回の認識バッチにつき1つ）
#[derive(Debug, Clone)]
pub struct ColorAssigner {
    tolerance: f64,
    bands: Vec<ColorBand>,
}

impl Default for ColorAssigner {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl ColorAssigner {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            bands: Vec::new(),
        }
    }

    pub fn bands(&self) -> &[ColorBand] {
        &self.bands
    }

    /// 1件に色を割り当て、その色を返す
    pub fn assign(&mut self, fragment: &mut TextFragment) -> ColorTag {
        let min_y = fragment.bounds.min_y;
        let height = fragment.bounds.height;

        let matched = self.bands.iter().find(|band| {
            (band.min_y - min_y).abs() < self.tolerance
                && (band.height - height).abs() < self.tolerance
        });

        let color = match matched {
            Some(band) => band.color,
            None => {
                let color = PALETTE[self.bands.len() % PALETTE.len()];
                self.bands.push(ColorBand { min_y, height, color });
                color
            }
        };

        fragment.color = Some(color);
        color
    }
}

/// 既定の許容差で色分け
pub fn assign_colors(fragments: Vec<TextFragment>) -> Vec<TextFragment> {
    assign_colors_with_tolerance(fragments, DEFAULT_TOLERANCE)
}

/// 許容差を指定して色分け
///
/// 帯の状態はこの呼び出しの中だけで持つ。同じ入力順なら常に同じ色になる。
///
/// # Arguments
/// * `fragments` - 到着順の断片
/// * `tolerance` - 帯の min_y・高さの一致判定に使う許容差
///
/// # Returns
/// 入力順のまま、全断片に `color` を設定したもの
pub fn assign_colors_with_tolerance(
    fragments: Vec<TextFragment>,
    tolerance: f64,
) -> Vec<TextFragment> {
    let mut assigner = ColorAssigner::new(tolerance);
    fragments
        .into_iter()
        .map(|mut fragment| {
            assigner.assign(&mut fragment);
            fragment
        })
        .collect()
}
