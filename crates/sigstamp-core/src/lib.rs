//! Signature field placement and PDF compositing
//!
//! Fields arrive in page-normalized, top-left-origin coordinates from the
//! editor. This crate maps them into PDF point space, fits the signature image
//! into each box without distortion, draws it with lopdf, and hashes the
//! original and signed documents for the audit trail.
//!
//! Entry points:
//! - [`signing::stamp`]: synchronous compositing plus digests
//! - [`signing::record_audit`]: best-effort audit persistence
//! - [`pipeline::composite`]: compositing over any [`DocumentEngine`]

pub mod asset;
pub mod audit;
pub mod classify;
pub mod coords;
pub mod engine;
pub mod error;
pub mod fit;
pub mod pdf;
pub mod pipeline;
pub mod sample;
pub mod signing;
pub mod types;

pub use asset::{decode_asset, decode_base64_asset, strip_data_uri, AssetDecode, ImageAsset};
pub use audit::{content_digest, verify_digest, AuditRecord, AuditStore, SignerMeta, StoredAudit};
pub use classify::image_bearing;
pub use coords::normalized_to_page;
pub use engine::DocumentEngine;
pub use error::{EngineError, GeometryError, PersistenceError, SignError, SourceError};
pub use fit::fit_inside;
pub use pdf::{PdfEngine, PdfImage};
pub use pipeline::{
    composite, composite_pdf, CompositeReport, Composited, PlacedField, SkipReason, SkippedField,
};
pub use sample::sample_document;
pub use signing::{record_audit, stamp, DocumentSource, SignRequest, Stamped};
pub use types::{AssetSize, Field, FieldKind, PageGeometry, Rect};
