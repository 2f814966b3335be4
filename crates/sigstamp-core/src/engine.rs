//! Document engine abstraction
//!
//! The compositor only needs five things from a document library: load
//! bytes, report page sizes, embed an image once, draw it on pages, and
//! serialize. [`crate::pdf::PdfEngine`] implements this over lopdf.

use crate::asset::ImageAsset;
use crate::error::EngineError;
use crate::types::{PageGeometry, Rect};

pub trait DocumentEngine: Sized {
    /// Handle to an image embedded in this document
    type Image;

    /// Parse a document from raw bytes
    fn load(bytes: &[u8]) -> Result<Self, EngineError>;

    /// Number of pages in the document
    fn page_count(&self) -> usize;

    /// Size of one page, by zero-based ordinal. Only pages that are actually
    /// targeted get asked for, so a malformed page elsewhere does not matter.
    fn page_geometry(&self, page_index: usize) -> Result<PageGeometry, EngineError>;

    /// Embed an image so it can be drawn any number of times
    fn embed_image(&mut self, asset: &ImageAsset) -> Result<Self::Image, EngineError>;

    /// Draw an embedded image stretched to `rect` (page space) on a page
    fn draw_image(
        &mut self,
        page_index: usize,
        image: &Self::Image,
        rect: Rect,
    ) -> Result<(), EngineError>;

    /// Serialize the document, consuming the handle
    fn save(self) -> Result<Vec<u8>, EngineError>;
}
