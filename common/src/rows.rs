//! 行再構成
//!
//! 順不同のOCR断片を、上から下・左から右の表形式（行の並び）に組み直す。
//!
//! 1. 断片を上端（max_y）の降順に並べる
//! 2. 先頭から1回だけ走査し、基準断片との中心Y差が閾値未満なら同じ行に追加
//! 3. 行を閉じるときに min_x 昇順で並べ替える

use crate::types::TextFragment;
use serde::{Deserialize, Serialize};

/// 閾値 = 基準断片の高さ × この比率
pub const ROW_THRESHOLD_RATIO: f64 = 0.5;

/// 高さ0や負の断片で閾値が0にならないための下限（画像高さの0.5%）
pub const MIN_ROW_THRESHOLD: f64 = 0.005;

/// 行継続判定の基準断片
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowAnchor {
    /// 直前に追加した断片（行が伸びるたびに基準が移る）
    #[default]
    LastAppended,
    /// 行の最初の断片
    First,
}

/// 1行分の断片（min_x 昇順）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    pub fragments: Vec<TextFragment>,
}

impl Row {
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// セル文字列（左から右）
    pub fn texts(&self) -> Vec<String> {
        self.fragments.iter().map(|f| f.text.clone()).collect()
    }

    /// 行の代表位置（最も高い上端）
    pub fn top(&self) -> f64 {
        self.fragments
            .iter()
            .map(|f| f.bounds.max_y())
            .fold(f64::NEG_INFINITY, f64::max)
    }

    fn close(mut fragments: Vec<TextFragment>) -> Self {
        fragments.sort_by(|a, b| a.bounds.min_x.total_cmp(&b.bounds.min_x));
        Self { fragments }
    }
}

/// 行グルーピングの設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowGrouper {
    pub anchor: RowAnchor,
    pub threshold_ratio: f64,
    pub min_threshold: f64,
}

impl Default for RowGrouper {
    fn default() -> Self {
        Self {
            anchor: RowAnchor::LastAppended,
            threshold_ratio: ROW_THRESHOLD_RATIO,
            min_threshold: MIN_ROW_THRESHOLD,
        }
    }
}

impl RowGrouper {
    pub fn with_anchor(mut self, anchor: RowAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// 基準断片から求める行継続の閾値
    pub fn threshold_for(&self, reference: &TextFragment) -> f64 {
        (reference.bounds.height.max(0.0) * self.threshold_ratio).max(self.min_threshold)
    }

    /// 断片が現在の行に続くか（閾値ちょうどは別の行）
    pub fn continues_row(&self, reference: &TextFragment, fragment: &TextFragment) -> bool {
        let distance = (fragment.bounds.mid_y() - reference.bounds.mid_y()).abs();
        distance < self.threshold_for(reference)
    }

    /// 断片を行に分割する
    ///
    /// 入力の全断片がちょうど1回ずつ出力のいずれかの行に現れる。
    pub fn group(&self, fragments: Vec<TextFragment>) -> Vec<Row> {
        let mut sorted = fragments;
        sorted.sort_by(|a, b| b.bounds.max_y().total_cmp(&a.bounds.max_y()));

        let (mut rows, current) = sorted.into_iter().fold(
            (Vec::<Row>::new(), Vec::<TextFragment>::new()),
            |(mut rows, mut current), fragment| {
                let reference = match self.anchor {
                    RowAnchor::LastAppended => current.last(),
                    RowAnchor::First => current.first(),
                };
                match reference {
                    Some(reference) if !self.continues_row(reference, &fragment) => {
                        rows.push(Row::close(std::mem::take(&mut current)));
                        current.push(fragment);
                    }
                    _ => current.push(fragment),
                }
                (rows, current)
            },
        );

        if !current.is_empty() {
            rows.push(Row::close(current));
        }
        rows
    }
}

/// 既定設定（直前断片基準）で行に分割
///
/// # Arguments
/// * `fragments` - 順不同の断片（補正済みであること）
///
/// # Returns
/// 上から下への行の並び。各行は min_x 昇順。空の入力なら空
///
/// # Examples
/// ```
/// use receipt_scan_common::{group_into_rows, NormalizedRect, TextFragment};
///
/// let rows = group_into_rows(vec![
///     TextFragment::new("$9.99", NormalizedRect::new(0.6, 0.8, 0.15, 0.05)),
///     TextFragment::new("Widget", NormalizedRect::new(0.1, 0.8, 0.3, 0.05)),
/// ]);
/// assert_eq!(rows[0].texts(), vec!["Widget", "$9.99"]);
/// ```
pub fn group_into_rows(fragments: Vec<TextFragment>) -> Vec<Row> {
    RowGrouper::default().group(fragments)
}
