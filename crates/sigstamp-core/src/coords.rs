//! Coordinate transformation between normalized editor space and PDF page space

use crate::types::{Field, PageGeometry, Rect};

/// Convert a field's normalized box (top-left origin, fractions of the page)
/// to a page-space rectangle (bottom-left origin, points).
///
/// No clamping: boxes hanging off the page map to coordinates outside it.
pub fn normalized_to_page(field: &Field, page: PageGeometry) -> Rect {
    let width = field.w_pct * page.width_pt;
    let height = field.h_pct * page.height_pt;
    let x = field.x_pct * page.width_pt;

    // Flip Y: the top edge is measured down from the page top, the rectangle
    // origin is its bottom edge measured up from the page bottom.
    let top = page.height_pt - field.y_pct * page.height_pt;
    let y = top - height;

    Rect::new(x, y, width, height)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::types::FieldKind;
    use proptest::prelude::*;

    fn dimension() -> impl Strategy<Value = f64> {
        1.0f64..2000.0
    }

    fn percentage() -> impl Strategy<Value = f64> {
        0.0f64..=1.0
    }

    fn field(x_pct: f64, y_pct: f64, w_pct: f64, h_pct: f64) -> Field {
        Field {
            id: "f".into(),
            document_id: "doc".into(),
            page_index: 0,
            kind: FieldKind::Signature,
            x_pct,
            y_pct,
            w_pct,
            h_pct,
        }
    }

    proptest! {
        /// Property: left edge is x_pct of the width, top edge is y_pct down from the top
        #[test]
        fn edges_match_direct_computation(
            page_w in dimension(),
            page_h in dimension(),
            x_pct in percentage(),
            y_pct in percentage(),
            w_pct in percentage(),
            h_pct in percentage(),
        ) {
            let page = PageGeometry::new(page_w, page_h);
            let rect = normalized_to_page(&field(x_pct, y_pct, w_pct, h_pct), page);

            let tolerance = 1e-9 * page_h.max(page_w);
            prop_assert_eq!(rect.x, x_pct * page_w);
            prop_assert!(
                (rect.top() - (page_h - y_pct * page_h)).abs() <= tolerance,
                "top edge {} expected {}", rect.top(), page_h - y_pct * page_h
            );
            prop_assert_eq!(rect.width, w_pct * page_w);
            prop_assert_eq!(rect.height, h_pct * page_h);
        }
    }
}
