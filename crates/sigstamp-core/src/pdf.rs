//! lopdf-backed document engine

use std::collections::HashSet;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::asset::{ColorSpace, ImageAsset, Pixels};
use crate::engine::DocumentEngine;
use crate::error::EngineError;
use crate::types::{PageGeometry, Rect};

/// Inheritance chains deeper than this are treated as malformed
const MAX_TREE_DEPTH: usize = 64;

/// A loaded PDF exclusively owned by one compositing run
pub struct PdfEngine {
    doc: Document,
    pages: Vec<ObjectId>,
    /// Pages whose original content has been wrapped in q/Q
    isolated: HashSet<ObjectId>,
}

/// Image XObject embedded in a [`PdfEngine`] document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfImage {
    id: ObjectId,
    name: String,
}

/// Where a page's resource dictionary lives
#[derive(Clone, Copy)]
enum ResourcesLoc {
    /// Inline in the page dictionary
    Page(ObjectId),
    /// Indirect object
    Object(ObjectId),
}

impl PdfEngine {
    /// Borrow the underlying lopdf document
    pub fn document(&self) -> &Document {
        &self.doc
    }

    fn page_id(&self, page_index: usize) -> Result<ObjectId, EngineError> {
        self.pages
            .get(page_index)
            .copied()
            .ok_or_else(|| EngineError::Draw {
                page: page_index,
                reason: format!("document has {} page(s)", self.pages.len()),
            })
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    /// Look up a page attribute, following the Parent chain for inherited keys
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<Object> {
        let mut current = Some(page_id);
        for _ in 0..MAX_TREE_DEPTH {
            let dict = self.doc.get_dictionary(current?).ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(value.clone());
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        None
    }

    fn media_box(&self, page_index: usize, page_id: ObjectId) -> Result<PageGeometry, EngineError> {
        let malformed = |reason: &str| EngineError::MalformedPage {
            page: page_index,
            reason: reason.to_string(),
        };

        let media_box = self
            .inherited(page_id, b"MediaBox")
            .ok_or_else(|| malformed("no MediaBox"))?;
        let values = match self.resolve(&media_box) {
            Object::Array(values) => values,
            _ => return Err(malformed("MediaBox is not an array")),
        };
        if values.len() != 4 {
            return Err(malformed("MediaBox must have four numbers"));
        }

        let mut coords = [0.0f64; 4];
        for (slot, value) in coords.iter_mut().zip(values) {
            *slot = match self.resolve(value) {
                Object::Integer(i) => *i as f64,
                Object::Real(r) => *r as f64,
                _ => return Err(malformed("MediaBox entry is not a number")),
            };
        }

        let [llx, lly, urx, ury] = coords;
        Ok(PageGeometry::new((urx - llx).abs(), (ury - lly).abs()))
    }

    /// Give the page its own Resources entry so edits don't land on a parent
    fn own_resources(&mut self, page_id: ObjectId) -> Result<ResourcesLoc, lopdf::Error> {
        let existing = self.doc.get_dictionary(page_id)?.get(b"Resources").ok().cloned();
        let resources = match existing {
            Some(obj) => obj,
            None => {
                let inherited = self
                    .inherited(page_id, b"Resources")
                    .unwrap_or_else(|| Object::Dictionary(Dictionary::new()));
                self.doc
                    .get_object_mut(page_id)?
                    .as_dict_mut()?
                    .set("Resources", inherited.clone());
                inherited
            }
        };

        match resources {
            Object::Reference(id) => Ok(ResourcesLoc::Object(id)),
            _ => Ok(ResourcesLoc::Page(page_id)),
        }
    }

    fn resources_mut(&mut self, loc: ResourcesLoc) -> Result<&mut Dictionary, lopdf::Error> {
        match loc {
            ResourcesLoc::Object(id) => self.doc.get_object_mut(id)?.as_dict_mut(),
            ResourcesLoc::Page(page_id) => self
                .doc
                .get_object_mut(page_id)?
                .as_dict_mut()?
                .get_mut(b"Resources")?
                .as_dict_mut(),
        }
    }

    fn register_xobject(
        &mut self,
        page_id: ObjectId,
        image: &PdfImage,
    ) -> Result<(), lopdf::Error> {
        let loc = self.own_resources(page_id)?;

        let shared_xobjects = match self.resources_mut(loc)?.get(b"XObject") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };
        if let Some(id) = shared_xobjects {
            self.doc
                .get_object_mut(id)?
                .as_dict_mut()?
                .set(image.name.as_bytes(), Object::Reference(image.id));
            return Ok(());
        }

        let resources = self.resources_mut(loc)?;
        let has_inline = matches!(resources.get(b"XObject"), Ok(Object::Dictionary(_)));
        if !has_inline {
            resources.set("XObject", Object::Dictionary(Dictionary::new()));
        }
        if let Ok(Object::Dictionary(xobjects)) = resources.get_mut(b"XObject") {
            xobjects.set(image.name.as_bytes(), Object::Reference(image.id));
        }
        Ok(())
    }

    /// Current content streams of a page as a flat list of references
    fn page_contents(&self, page_id: ObjectId) -> Result<Vec<Object>, lopdf::Error> {
        let page = self.doc.get_dictionary(page_id)?;
        Ok(match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        })
    }

    fn append_content(
        &mut self,
        page_id: ObjectId,
        operations: Vec<Operation>,
    ) -> Result<(), lopdf::Error> {
        let encoded = Content { operations }.encode()?;
        let stream_id = self.doc.add_object(Stream::new(Dictionary::new(), encoded));

        let mut contents = self.page_contents(page_id)?;
        // Isolate the original content's graphics state from ours, once per page
        if self.isolated.insert(page_id) && !contents.is_empty() {
            let save = self.doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            let restore = self.doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
            contents.insert(0, Object::Reference(save));
            contents.push(Object::Reference(restore));
        }
        contents.push(Object::Reference(stream_id));

        self.doc
            .get_object_mut(page_id)?
            .as_dict_mut()?
            .set("Contents", Object::Array(contents));
        Ok(())
    }
}

fn device_color_space(color_space: ColorSpace) -> Object {
    let name: &[u8] = match color_space {
        ColorSpace::Gray => b"DeviceGray",
        ColorSpace::Rgb => b"DeviceRGB",
    };
    Object::Name(name.to_vec())
}

fn image_dictionary(width: u32, height: u32, color_space: Object, filter: &[u8]) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", color_space);
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(filter.to_vec()));
    dict
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, EngineError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| EngineError::Embed(format!("Failed to compress image data: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| EngineError::Embed(format!("Failed to finish compression: {}", e)))
}

impl DocumentEngine for PdfEngine {
    type Image = PdfImage;

    fn load(bytes: &[u8]) -> Result<Self, EngineError> {
        let doc = Document::load_mem(bytes).map_err(|e| EngineError::Load(e.to_string()))?;
        let pages = doc.get_pages().into_values().collect();
        Ok(Self {
            doc,
            pages,
            isolated: HashSet::new(),
        })
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_geometry(&self, page_index: usize) -> Result<PageGeometry, EngineError> {
        let page_id = self
            .pages
            .get(page_index)
            .copied()
            .ok_or_else(|| EngineError::MalformedPage {
                page: page_index,
                reason: format!("document has {} page(s)", self.pages.len()),
            })?;
        self.media_box(page_index, page_id)
    }

    fn embed_image(&mut self, asset: &ImageAsset) -> Result<PdfImage, EngineError> {
        let width = asset.size.width;
        let height = asset.size.height;
        let pixel_count = width as usize * height as usize;

        let stream = match &asset.pixels {
            Pixels::Raw { color, alpha } => {
                if color.len() != pixel_count * asset.color_space.components() {
                    return Err(EngineError::Embed(format!(
                        "expected {} color samples, got {}",
                        pixel_count * asset.color_space.components(),
                        color.len()
                    )));
                }
                let mut dict = image_dictionary(
                    width,
                    height,
                    device_color_space(asset.color_space),
                    b"FlateDecode",
                );

                if let Some(alpha) = alpha {
                    if alpha.len() != pixel_count {
                        return Err(EngineError::Embed(format!(
                            "expected {} alpha samples, got {}",
                            pixel_count,
                            alpha.len()
                        )));
                    }
                    let smask = Stream::new(
                        image_dictionary(
                            width,
                            height,
                            Object::Name(b"DeviceGray".to_vec()),
                            b"FlateDecode",
                        ),
                        deflate(alpha)?,
                    );
                    let smask_id = self.doc.add_object(smask);
                    dict.set("SMask", Object::Reference(smask_id));
                }

                Stream::new(dict, deflate(color)?)
            }
            Pixels::Dct { data } => {
                let dict = image_dictionary(
                    width,
                    height,
                    device_color_space(asset.color_space),
                    b"DCTDecode",
                );
                Stream::new(dict, data.clone())
            }
        };

        let id = self.doc.add_object(stream);
        Ok(PdfImage {
            id,
            name: format!("SigIm{}_{}", id.0, id.1),
        })
    }

    fn draw_image(
        &mut self,
        page_index: usize,
        image: &PdfImage,
        rect: Rect,
    ) -> Result<(), EngineError> {
        let page_id = self.page_id(page_index)?;
        let draw_err = |e: lopdf::Error| EngineError::Draw {
            page: page_index,
            reason: e.to_string(),
        };

        self.register_xobject(page_id, image).map_err(draw_err)?;

        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    (rect.width as f32).into(),
                    0.into(),
                    0.into(),
                    (rect.height as f32).into(),
                    (rect.x as f32).into(),
                    (rect.y as f32).into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(image.name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ];
        self.append_content(page_id, operations).map_err(draw_err)
    }

    fn save(mut self) -> Result<Vec<u8>, EngineError> {
        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| EngineError::Save(e.to_string()))?;
        Ok(output)
    }
}
