//! 認識結果の矩形補正
//!
//! 行グルーピングと色分けの前に呼ぶ。非有限値を含む断片は捨て、
//! 負の幅・高さは原点を移して正にし、単位正方形の内側に収める。

use crate::types::{NormalizedRect, TextFragment};

/// 補正結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sanitized {
    pub fragments: Vec<TextFragment>,
    pub dropped: usize,
}

/// 矩形を正規化して単位正方形に収める。非有限値なら None
pub fn normalize_rect(rect: &NormalizedRect) -> Option<NormalizedRect> {
    if !rect.is_finite() {
        return None;
    }

    let (x0, x1) = ordered(rect.min_x, rect.min_x + rect.width);
    let (y0, y1) = ordered(rect.min_y, rect.min_y + rect.height);

    let min_x = x0.clamp(0.0, 1.0);
    let min_y = y0.clamp(0.0, 1.0);
    let max_x = x1.clamp(0.0, 1.0);
    let max_y = y1.clamp(0.0, 1.0);

    Some(NormalizedRect::new(min_x, min_y, max_x - min_x, max_y - min_y))
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// 断片列を補正する
///
/// # Arguments
/// * `fragments` - 認識アダプタが返した断片
///
/// # Returns
/// * `fragments` - 矩形を単位正方形に収めた断片（入力順のまま）
/// * `dropped` - 非有限値を含むため捨てた件数
pub fn sanitize_fragments(fragments: Vec<TextFragment>) -> Sanitized {
    let total = fragments.len();
    let fragments: Vec<TextFragment> = fragments
        .into_iter()
        .filter_map(|mut fragment| {
            let bounds = normalize_rect(&fragment.bounds)?;
            fragment.bounds = bounds;
            Some(fragment)
        })
        .collect();

    Sanitized {
        dropped: total - fragments.len(),
        fragments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(min_x: f64, min_y: f64, width: f64, height: f64) -> TextFragment {
        TextFragment::new("t", NormalizedRect::new(min_x, min_y, width, height))
    }

    #[test]
    fn test_valid_rect_unchanged() {
        let rect = NormalizedRect::new(0.25, 0.5, 0.25, 0.125);
        assert_eq!(normalize_rect(&rect), Some(rect));
    }

    #[test]
    fn test_drops_non_finite() {
        let result = sanitize_fragments(vec![
            fragment(f64::NAN, 0.1, 0.1, 0.1),
            fragment(0.1, f64::INFINITY, 0.1, 0.1),
            fragment(0.1, 0.1, 0.1, f64::NEG_INFINITY),
            fragment(0.1, 0.1, 0.1, 0.1),
        ]);
        assert_eq!(result.dropped, 3);
        assert_eq!(result.fragments.len(), 1);
    }

    #[test]
    fn test_negative_size_moves_origin() {
        let rect = normalize_rect(&NormalizedRect::new(0.5, 0.75, -0.25, -0.5)).unwrap();
        assert_eq!(rect, NormalizedRect::new(0.25, 0.25, 0.25, 0.5));
    }

    #[test]
    fn test_clamps_into_unit_square() {
        let rect = normalize_rect(&NormalizedRect::new(-0.25, 0.75, 0.5, 0.5)).unwrap();
        assert_eq!(rect, NormalizedRect::new(0.0, 0.75, 0.25, 0.25));

        // 完全に外側なら幅0
        let outside = normalize_rect(&NormalizedRect::new(1.5, 0.5, 0.25, 0.25)).unwrap();
        assert_eq!(outside.min_x, 1.0);
        assert_eq!(outside.width, 0.0);
    }

    #[test]
    fn test_keeps_order_and_ids() {
        let a = fragment(0.1, 0.1, 0.1, 0.1);
        let b = fragment(0.5, 0.5, 0.1, 0.1);
        let ids = vec![a.id.clone(), b.id.clone()];
        let result = sanitize_fragments(vec![a, b]);
        let out: Vec<_> = result.fragments.iter().map(|f| f.id.clone()).collect();
        assert_eq!(out, ids);
        assert_eq!(result.dropped, 0);
    }
}
