//! Aspect-preserving placement of an asset inside a target box

use crate::error::GeometryError;
use crate::types::{AssetSize, Rect};

/// Largest rectangle with the asset's aspect ratio that fits in `bounds`,
/// centered on both axes.
///
/// Fails on a zero-area asset or a box without positive extent on both
/// axes, instead of dividing by zero.
pub fn fit_inside(asset: AssetSize, bounds: Rect) -> Result<Rect, GeometryError> {
    if asset.width == 0 || asset.height == 0 {
        return Err(GeometryError::EmptyAsset {
            width: asset.width as f64,
            height: asset.height as f64,
        });
    }
    // NaN fails these comparisons too
    if !(bounds.width > 0.0 && bounds.height > 0.0) {
        return Err(GeometryError::EmptyBox {
            width: bounds.width,
            height: bounds.height,
        });
    }

    let asset_aspect = asset.width as f64 / asset.height as f64;
    let box_aspect = bounds.width / bounds.height;

    let (width, height) = if asset_aspect > box_aspect {
        // relatively wider than the box: pin to box width
        (bounds.width, bounds.width / asset_aspect)
    } else {
        (bounds.height * asset_aspect, bounds.height)
    };

    let x = bounds.x + (bounds.width - width) / 2.0;
    let y = bounds.y + (bounds.height - height) / 2.0;

    Ok(Rect::new(x, y, width, height))
}
