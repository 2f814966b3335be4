//! Signature asset decoding
//!
//! The editor sends the signature as base64, usually as a canvas data URL.
//! Decoding is an ordered attempt: PNG first, then JPEG. Anything else is
//! reported as [`AssetDecode::Unrecognized`].

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::codecs::jpeg::JpegDecoder;
use image::{DynamicImage, ExtendedColorType, ImageDecoder};

use crate::error::SignError;
use crate::types::AssetSize;

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Source encoding of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    Png,
    Jpeg,
}

/// Color model of the decoded samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
}

impl ColorSpace {
    pub fn components(self) -> usize {
        match self {
            ColorSpace::Gray => 1,
            ColorSpace::Rgb => 3,
        }
    }
}

/// Sample data ready for embedding
#[derive(Debug, Clone, PartialEq)]
pub enum Pixels {
    /// 8-bit samples, row-major, with an optional separate 8-bit alpha plane
    Raw { color: Vec<u8>, alpha: Option<Vec<u8>> },
    /// Gray or RGB JPEG passed through unchanged
    Dct { data: Vec<u8> },
}

/// A decoded image asset
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub format: AssetFormat,
    pub size: AssetSize,
    pub color_space: ColorSpace,
    pub pixels: Pixels,
}

/// Outcome of the ordered PNG-then-JPEG decode
#[derive(Debug)]
pub enum AssetDecode {
    Png(ImageAsset),
    Jpeg(ImageAsset),
    Unrecognized,
}

impl AssetDecode {
    pub fn into_asset(self) -> Option<ImageAsset> {
        match self {
            AssetDecode::Png(asset) | AssetDecode::Jpeg(asset) => Some(asset),
            AssetDecode::Unrecognized => None,
        }
    }
}

/// Remove a leading `data:image/<type>;base64,` prefix, if any
pub fn strip_data_uri(input: &str) -> &str {
    let Some(rest) = input.strip_prefix("data:image/") else {
        return input;
    };
    match rest.split_once(";base64,") {
        Some((subtype, payload))
            if !subtype.is_empty()
                && subtype
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            payload
        }
        _ => input,
    }
}

/// Decode a base64 asset, with or without a data URL prefix
pub fn decode_base64_asset(input: &str) -> Result<Vec<u8>, SignError> {
    let payload = strip_data_uri(input.trim());
    // data URLs pasted from logs sometimes carry line breaks
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(compact.as_bytes())
        .map_err(|e| SignError::UnsupportedAssetFormat(format!("invalid base64: {}", e)))
}

/// Decode asset bytes: PNG first, JPEG second
pub fn decode_asset(bytes: &[u8]) -> AssetDecode {
    match decode_png(bytes) {
        Ok(asset) => return AssetDecode::Png(asset),
        Err(e) => tracing::debug!("asset is not a PNG: {}", e),
    }
    match decode_jpeg(bytes) {
        Ok(asset) => AssetDecode::Jpeg(asset),
        Err(e) => {
            tracing::debug!("asset is not a JPEG: {}", e);
            AssetDecode::Unrecognized
        }
    }
}

fn decode_png(bytes: &[u8]) -> Result<ImageAsset, String> {
    if !bytes.starts_with(&PNG_MAGIC) {
        return Err("missing PNG signature".to_string());
    }

    let mut decoder = png::Decoder::new(bytes);
    // palette, tRNS and low bit depths expand to 8-bit gray/RGB(A)
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(|e| e.to_string())?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buf).map_err(|e| e.to_string())?;
    buf.truncate(frame.buffer_size());

    if frame.bit_depth != png::BitDepth::Eight {
        return Err(format!("unexpected bit depth {:?}", frame.bit_depth));
    }

    let (color_space, has_alpha) = match frame.color_type {
        png::ColorType::Grayscale => (ColorSpace::Gray, false),
        png::ColorType::GrayscaleAlpha => (ColorSpace::Gray, true),
        png::ColorType::Rgb => (ColorSpace::Rgb, false),
        png::ColorType::Rgba => (ColorSpace::Rgb, true),
        png::ColorType::Indexed => return Err("palette was not expanded".to_string()),
    };

    let pixels = if has_alpha {
        let (color, alpha) = split_alpha(&buf, color_space.components());
        Pixels::Raw {
            color,
            alpha: Some(alpha),
        }
    } else {
        Pixels::Raw {
            color: buf,
            alpha: None,
        }
    };

    Ok(ImageAsset {
        format: AssetFormat::Png,
        size: AssetSize {
            width: frame.width,
            height: frame.height,
        },
        color_space,
        pixels,
    })
}

/// Split interleaved color+alpha samples into a color plane and an alpha plane
fn split_alpha(samples: &[u8], color_components: usize) -> (Vec<u8>, Vec<u8>) {
    let stride = color_components + 1;
    let pixel_count = samples.len() / stride;
    let mut color = Vec::with_capacity(pixel_count * color_components);
    let mut alpha = Vec::with_capacity(pixel_count);

    for px in samples.chunks_exact(stride) {
        color.extend_from_slice(&px[..color_components]);
        alpha.push(px[color_components]);
    }

    (color, alpha)
}

fn decode_jpeg(bytes: &[u8]) -> Result<ImageAsset, String> {
    let decoder = JpegDecoder::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let (width, height) = decoder.dimensions();
    let original = decoder.original_color_type();
    // decode the whole scan so header-only or truncated streams are rejected
    let image = DynamicImage::from_decoder(decoder).map_err(|e| e.to_string())?;

    if width == 0 || height == 0 {
        return Err("JPEG without dimensions".to_string());
    }
    let size = AssetSize { width, height };

    let (color_space, pixels) = match original {
        ExtendedColorType::L8 => (
            ColorSpace::Gray,
            Pixels::Dct {
                data: bytes.to_vec(),
            },
        ),
        ExtendedColorType::Rgb8 => (
            ColorSpace::Rgb,
            Pixels::Dct {
                data: bytes.to_vec(),
            },
        ),
        // CMYK and other layouts are embedded as decoded RGB samples
        _ => (
            ColorSpace::Rgb,
            Pixels::Raw {
                color: image.to_rgb8().into_raw(),
                alpha: None,
            },
        ),
    };

    Ok(ImageAsset {
        format: AssetFormat::Jpeg,
        size,
        color_space,
        pixels,
    })
}
