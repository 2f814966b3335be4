//! Field and geometry types shared by the placement engine

use serde::{Deserialize, Serialize};

/// Kind of a placed field, as tagged by the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Signature,
    Image,
    Date,
    Radio,
}

impl FieldKind {
    /// Whether this engine stamps the signature asset into fields of this kind
    pub fn is_image_bearing(self) -> bool {
        matches!(self, FieldKind::Signature)
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Signature => write!(f, "signature"),
            FieldKind::Image => write!(f, "image"),
            FieldKind::Date => write!(f, "date"),
            FieldKind::Radio => write!(f, "radio"),
        }
    }
}

/// A field placed on a document page.
///
/// Geometry is normalized to the page: `x_pct`/`y_pct` locate the top-left
/// corner measured from the page's top-left, `w_pct`/`h_pct` are fractions of
/// the page width and height. Nothing forces the box to stay on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    #[serde(rename = "pdfId")]
    pub document_id: String,
    /// Zero-based page ordinal. Signed so that an out-of-range value from a
    /// client is a per-field skip rather than a rejected request.
    pub page_index: i64,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub x_pct: f64,
    pub y_pct: f64,
    pub w_pct: f64,
    pub h_pct: f64,
}

/// Physical size of a page in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_pt: f64,
    pub height_pt: f64,
}

impl PageGeometry {
    pub fn new(width_pt: f64, height_pt: f64) -> Self {
        Self {
            width_pt,
            height_pt,
        }
    }

    /// ISO A4 in points
    pub fn a4() -> Self {
        Self::new(595.28, 841.89)
    }

    /// US Letter in points
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }
}

/// Page-space rectangle: bottom-left origin, y grows upward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// y coordinate of the top edge
    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    /// x coordinate of the right edge
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// Intrinsic pixel size of an image asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSize {
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn field_uses_editor_wire_names() {
        let json = r#"{
            "id": "f-1",
            "pdfId": "sample-a4",
            "pageIndex": 0,
            "type": "signature",
            "xPct": 0.1,
            "yPct": 0.8,
            "wPct": 0.3,
            "hPct": 0.08
        }"#;
        let field: Field = serde_json::from_str(json).unwrap();
        assert_eq!(field.document_id, "sample-a4");
        assert_eq!(field.kind, FieldKind::Signature);
        assert_eq!(field.page_index, 0);

        let back = serde_json::to_value(&field).unwrap();
        assert_eq!(back["pdfId"], "sample-a4");
        assert_eq!(back["type"], "signature");
        assert_eq!(back["wPct"], 0.3);
    }

    #[test]
    fn only_signature_is_image_bearing() {
        assert!(FieldKind::Signature.is_image_bearing());
        for kind in [
            FieldKind::Text,
            FieldKind::Image,
            FieldKind::Date,
            FieldKind::Radio,
        ] {
            assert!(!kind.is_image_bearing(), "{} should not be drawn", kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let json = r#"{"id":"f","pdfId":"d","pageIndex":0,"type":"checkbox",
            "xPct":0,"yPct":0,"wPct":0.1,"hPct":0.1}"#;
        assert!(serde_json::from_str::<Field>(json).is_err());
    }

    #[test]
    fn negative_page_index_parses() {
        let json = r#"{"id":"f","pdfId":"d","pageIndex":-1,"type":"signature",
            "xPct":0,"yPct":0,"wPct":0.1,"hPct":0.1}"#;
        let field: Field = serde_json::from_str(json).unwrap();
        assert_eq!(field.page_index, -1);
    }
}
