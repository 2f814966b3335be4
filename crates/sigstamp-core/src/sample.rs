//! One-page A4 sample document for exercising the signing flow

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use crate::error::EngineError;
use crate::types::PageGeometry;

const TITLE: &str = "Sample Document for Signature";

const BODY: &[&str] = &[
    "This is a sample PDF document for testing signature placement.",
    "",
    "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Sed do eiusmod",
    "tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim",
    "veniam, quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea",
    "commodo consequat.",
    "",
    "Duis aute irure dolor in reprehenderit in voluptate velit esse cillum",
    "dolore eu fugiat nulla pariatur. Excepteur sint occaecat cupidatat non",
    "proident, sunt in culpa qui officia deserunt mollit anim id est laborum.",
    "",
    "",
    "",
    "Signature: _________________________________",
    "",
    "Date: _____________________",
];

const MARGIN_X: f32 = 50.0;
const LINE_HEIGHT: f32 = 20.0;

fn text_at(font: &str, size: f32, x: f32, y: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// Build the sample document: bold title, body text, signature and date lines
pub fn sample_document() -> Result<Vec<u8>, EngineError> {
    let page = PageGeometry::a4();
    let width = page.width_pt as f32;
    let height = page.height_pt as f32;

    let mut operations = text_at("F2", 24.0, MARGIN_X, height - 50.0, TITLE);
    let mut y = height - 100.0;
    for line in BODY {
        if !line.is_empty() {
            operations.extend(text_at("F1", 12.0, MARGIN_X, y, line));
        }
        y -= LINE_HEIGHT;
    }

    let content = Content { operations }
        .encode()
        .map_err(|e| EngineError::Save(e.to_string()))?;

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| EngineError::Save(e.to_string()))?;
    Ok(buffer)
}
