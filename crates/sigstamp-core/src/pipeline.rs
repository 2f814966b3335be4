//! Compositing pipeline: stamp one signature asset into every signature field
//!
//! Asset decode, embedding and serialization failures abort the run. Problems
//! local to one field (missing page, degenerate box) skip that field only.

use serde::Serialize;
use tracing::{debug, warn};

use crate::asset::{decode_asset, AssetDecode};
use crate::classify::image_bearing;
use crate::coords::normalized_to_page;
use crate::engine::DocumentEngine;
use crate::error::{GeometryError, SignError};
use crate::fit::fit_inside;
use crate::pdf::PdfEngine;
use crate::types::{Field, Rect};

/// Why a field was left out of the output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    PageOutOfRange { page_index: i64, page_count: usize },
    Geometry { error: GeometryError },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::PageOutOfRange {
                page_index,
                page_count,
            } => write!(
                f,
                "page {} not found (document has {} page(s))",
                page_index, page_count
            ),
            SkipReason::Geometry { error } => write!(f, "degenerate geometry: {}", error),
        }
    }
}

/// A field that was skipped, with the reason
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedField {
    pub field_id: String,
    pub reason: SkipReason,
}

impl From<SkippedField> for SignError {
    fn from(skip: SkippedField) -> Self {
        match skip.reason {
            SkipReason::PageOutOfRange {
                page_index,
                page_count,
            } => SignError::PageOutOfRange {
                field_id: skip.field_id,
                page_index,
                page_count,
            },
            SkipReason::Geometry { error } => SignError::Geometry {
                field_id: skip.field_id,
                source: error,
            },
        }
    }
}

/// A field that was drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedField {
    pub field_id: String,
    pub page_index: usize,
    /// Field box in page space
    pub bounds: Rect,
    /// Where the asset was drawn inside the box
    pub draw: Rect,
}

/// What happened to each image-bearing field
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompositeReport {
    pub placed: Vec<PlacedField>,
    pub skipped: Vec<SkippedField>,
}

/// Output of a successful compositing run
#[derive(Debug, Clone)]
pub struct Composited {
    pub bytes: Vec<u8>,
    pub report: CompositeReport,
}

/// Stamp `asset` into every signature field of `original` using engine `E`.
///
/// The engine handle is created here and consumed by `save`, so every run
/// works on its own document instance.
pub fn composite<E: DocumentEngine>(
    original: &[u8],
    fields: &[Field],
    asset: &[u8],
) -> Result<Composited, SignError> {
    let asset = match decode_asset(asset) {
        AssetDecode::Png(asset) | AssetDecode::Jpeg(asset) => asset,
        AssetDecode::Unrecognized => {
            return Err(SignError::UnsupportedAssetFormat(
                "only PNG and JPEG are supported".to_string(),
            ))
        }
    };
    debug!(
        "decoded {:?} asset {}x{}",
        asset.format, asset.size.width, asset.size.height
    );

    let mut engine = E::load(original)?;
    let image = engine.embed_image(&asset)?;
    let page_count = engine.page_count();

    let targets = image_bearing(fields);
    let mut report = CompositeReport::default();

    for field in &targets {
        let target = usize::try_from(field.page_index)
            .ok()
            .filter(|&index| index < page_count);
        let Some(page_index) = target else {
            warn!(
                "Page {} not found, skipping field {}",
                field.page_index, field.id
            );
            report.skipped.push(SkippedField {
                field_id: field.id.clone(),
                reason: SkipReason::PageOutOfRange {
                    page_index: field.page_index,
                    page_count,
                },
            });
            continue;
        };

        let page = engine.page_geometry(page_index)?;
        let bounds = normalized_to_page(field, page);
        let draw = match fit_inside(asset.size, bounds) {
            Ok(draw) => draw,
            Err(e) => {
                warn!("Field {} has degenerate geometry, skipping: {}", field.id, e);
                report.skipped.push(SkippedField {
                    field_id: field.id.clone(),
                    reason: SkipReason::Geometry { error: e },
                });
                continue;
            }
        };

        engine.draw_image(page_index, &image, draw)?;
        report.placed.push(PlacedField {
            field_id: field.id.clone(),
            page_index,
            bounds,
            draw,
        });
    }

    // Local recovery only holds while something still gets signed
    if !targets.is_empty() && report.placed.is_empty() {
        if let Some(first) = report.skipped.first().cloned() {
            return Err(first.into());
        }
    }

    let bytes = engine.save()?;
    Ok(Composited { bytes, report })
}

/// [`composite`] with the lopdf engine
pub fn composite_pdf(
    original: &[u8],
    fields: &[Field],
    asset: &[u8],
) -> Result<Composited, SignError> {
    composite::<PdfEngine>(original, fields, asset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::fixtures as assets;
    use crate::asset::ImageAsset;
    use crate::error::EngineError;
    use crate::pdf::fixtures::{pdf_with_pages, pdf_with_unsized_page};
    use crate::types::{FieldKind, PageGeometry};
    use pretty_assertions::assert_eq;

    fn field(
        id: &str,
        kind: FieldKind,
        page_index: i64,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    ) -> Field {
        Field {
            id: id.into(),
            document_id: "sample-a4".into(),
            page_index,
            kind,
            x_pct: x,
            y_pct: y,
            w_pct: w,
            h_pct: h,
        }
    }

    #[test]
    fn test_a4_signature_fits_width() {
        let pdf = pdf_with_pages(1, 595.28, 841.89);
        let fields = vec![field("sig", FieldKind::Signature, 0, 0.1, 0.8, 0.3, 0.08)];
        // 3:1 asset against a ~2.65:1 box
        let out = composite_pdf(&pdf, &fields, &assets::png_rgba(300, 100)).unwrap();

        assert_eq!(out.report.skipped, vec![]);
        let placed = &out.report.placed[0];
        assert!((placed.bounds.width - 178.58).abs() < 0.01);
        assert!((placed.bounds.height - 67.35).abs() < 0.01);
        assert!((placed.draw.width - 178.58).abs() < 0.01);
        assert!((placed.draw.height - 59.53).abs() < 0.01);
        let gap_below = placed.draw.y - placed.bounds.y;
        let gap_above = placed.bounds.top() - placed.draw.top();
        assert!((gap_below - gap_above).abs() < 1e-6);
        assert!(out.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_missing_page_skipped_others_drawn() {
        let pdf = pdf_with_pages(1, 612.0, 792.0);
        let fields = vec![
            field("ghost", FieldKind::Signature, 5, 0.1, 0.1, 0.2, 0.05),
            field("real", FieldKind::Signature, 0, 0.1, 0.5, 0.2, 0.05),
        ];
        let out = composite_pdf(&pdf, &fields, &assets::png_gray(20, 10)).unwrap();

        assert_eq!(out.report.placed.len(), 1);
        assert_eq!(out.report.placed[0].field_id, "real");
        assert_eq!(
            out.report.skipped[0].reason,
            SkipReason::PageOutOfRange {
                page_index: 5,
                page_count: 1
            }
        );
    }

    #[test]
    fn test_unsupported_asset_fails_whole_run() {
        let pdf = pdf_with_pages(1, 612.0, 792.0);
        let fields = vec![field("sig", FieldKind::Signature, 0, 0.1, 0.1, 0.2, 0.05)];
        let err = composite_pdf(&pdf, &fields, b"GIF89a....").unwrap_err();
        assert!(matches!(err, SignError::UnsupportedAssetFormat(_)));
    }

    #[test]
    fn test_non_signature_fields_not_drawn() {
        let pdf = pdf_with_pages(1, 612.0, 792.0);
        let fields = vec![
            field("t", FieldKind::Text, 0, 0.1, 0.1, 0.2, 0.05),
            field("d", FieldKind::Date, 0, 0.1, 0.2, 0.2, 0.05),
        ];
        let out = composite_pdf(&pdf, &fields, &assets::png_gray(4, 4)).unwrap();
        assert!(out.report.placed.is_empty());
        assert!(out.report.skipped.is_empty());
    }

    #[test]
    fn test_all_fields_degenerate_surfaces_first_error() {
        let pdf = pdf_with_pages(1, 612.0, 792.0);
        let fields = vec![
            field("flat", FieldKind::Signature, 0, 0.1, 0.1, 0.2, 0.0),
            field("gone", FieldKind::Signature, 9, 0.1, 0.1, 0.2, 0.1),
        ];
        let err = composite_pdf(&pdf, &fields, &assets::png_gray(4, 4)).unwrap_err();
        match err {
            SignError::Geometry { field_id, .. } => assert_eq!(field_id, "flat"),
            other => panic!("expected geometry error, got {:?}", other),
        }
    }

    #[test]
    fn test_draw_order_follows_submission() {
        let pdf = pdf_with_pages(2, 612.0, 792.0);
        let fields = vec![
            field("b", FieldKind::Signature, 1, 0.1, 0.1, 0.2, 0.05),
            field("x", FieldKind::Text, 0, 0.1, 0.1, 0.2, 0.05),
            field("a", FieldKind::Signature, 0, 0.1, 0.1, 0.2, 0.05),
        ];
        let out = composite_pdf(&pdf, &fields, &assets::png_gray(4, 4)).unwrap();
        let order: Vec<&str> = out.report.placed.iter().map(|p| p.field_id.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn test_same_input_same_output() {
        let pdf = pdf_with_pages(1, 612.0, 792.0);
        let fields = vec![field("sig", FieldKind::Signature, 0, 0.25, 0.7, 0.3, 0.1)];
        let asset = assets::png_rgba(30, 10);
        let first = composite_pdf(&pdf, &fields, &asset).unwrap();
        let second = composite_pdf(&pdf, &fields, &asset).unwrap();
        assert_eq!(first.bytes, second.bytes);
    }

    /// Engine that fails on save, for the fatal path
    struct BrokenSave(PdfEngine);

    impl DocumentEngine for BrokenSave {
        type Image = <PdfEngine as DocumentEngine>::Image;

        fn load(bytes: &[u8]) -> Result<Self, EngineError> {
            PdfEngine::load(bytes).map(BrokenSave)
        }

        fn page_count(&self) -> usize {
            self.0.page_count()
        }

        fn page_geometry(&self, page_index: usize) -> Result<PageGeometry, EngineError> {
            self.0.page_geometry(page_index)
        }

        fn embed_image(&mut self, asset: &ImageAsset) -> Result<Self::Image, EngineError> {
            self.0.embed_image(asset)
        }

        fn draw_image(
            &mut self,
            page_index: usize,
            image: &Self::Image,
            rect: Rect,
        ) -> Result<(), EngineError> {
            self.0.draw_image(page_index, image, rect)
        }

        fn save(self) -> Result<Vec<u8>, EngineError> {
            Err(EngineError::Save("disk on fire".into()))
        }
    }

    #[test]
    fn test_save_failure_is_fatal() {
        let pdf = pdf_with_pages(1, 612.0, 792.0);
        let fields = vec![field("sig", FieldKind::Signature, 0, 0.1, 0.1, 0.2, 0.05)];
        let err = composite::<BrokenSave>(&pdf, &fields, &assets::png_gray(4, 4)).unwrap_err();
        assert!(matches!(err, SignError::CompositingFailed(EngineError::Save(_))));
    }

    #[test]
    fn test_unparseable_document_is_compositing_failure() {
        let fields = vec![field("sig", FieldKind::Signature, 0, 0.1, 0.1, 0.2, 0.05)];
        let err =
            composite_pdf(b"%PDF-1.7 truncated", &fields, &assets::png_gray(4, 4)).unwrap_err();
        assert!(matches!(err, SignError::CompositingFailed(EngineError::Load(_))));
    }

    #[test]
    fn test_negative_page_index_is_skipped() {
        let pdf = pdf_with_pages(1, 612.0, 792.0);
        let fields = vec![
            field("neg", FieldKind::Signature, -1, 0.1, 0.1, 0.2, 0.05),
            field("ok", FieldKind::Signature, 0, 0.1, 0.5, 0.2, 0.05),
        ];
        let out = composite_pdf(&pdf, &fields, &assets::png_gray(20, 10)).unwrap();

        assert_eq!(out.report.placed.len(), 1);
        assert_eq!(out.report.placed[0].field_id, "ok");
        assert_eq!(
            out.report.skipped,
            vec![SkippedField {
                field_id: "neg".into(),
                reason: SkipReason::PageOutOfRange {
                    page_index: -1,
                    page_count: 1
                },
            }]
        );
    }

    #[test]
    fn test_only_negative_pages_fails_with_page_error() {
        let pdf = pdf_with_pages(1, 612.0, 792.0);
        let fields = vec![field("neg", FieldKind::Signature, -3, 0.1, 0.1, 0.2, 0.05)];
        let err = composite_pdf(&pdf, &fields, &assets::png_gray(4, 4)).unwrap_err();
        assert!(matches!(
            err,
            SignError::PageOutOfRange { page_index: -3, page_count: 1, .. }
        ));
    }

    #[test]
    fn test_untargeted_malformed_page_does_not_block() {
        // page 1 has no MediaBox anywhere in its inheritance chain
        let pdf = pdf_with_unsized_page();
        let fields = vec![field("sig", FieldKind::Signature, 0, 0.1, 0.1, 0.2, 0.05)];
        let out = composite_pdf(&pdf, &fields, &assets::png_gray(4, 4)).unwrap();
        assert_eq!(out.report.placed.len(), 1);

        let fields = vec![field("sig", FieldKind::Signature, 1, 0.1, 0.1, 0.2, 0.05)];
        let err = composite_pdf(&pdf, &fields, &assets::png_gray(4, 4)).unwrap_err();
        assert!(matches!(
            err,
            SignError::CompositingFailed(EngineError::MalformedPage { page: 1, .. })
        ));
    }
}
