//! Selects the fields the compositor draws

use crate::types::Field;

/// Image-bearing fields in submission order.
///
/// Stable filter: the draw order is the order the editor submitted.
pub fn image_bearing(fields: &[Field]) -> Vec<&Field> {
    fields.iter().filter(|f| f.kind.is_image_bearing()).collect()
}
