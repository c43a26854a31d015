//! Image XObject decoding.
//!
//! Encoded formats a viewer can open directly (JPEG, JPEG 2000) are passed
//! through unchanged. Plain 8-bit gray and RGB samples are wrapped as PNG.
//! Everything else is handed out as decoded stream bytes with the `bin`
//! extension.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Document, Object, ObjectId, Stream};
use pdfedit_core::{BBox, Ctm, Point, RawImage, flip_y};

use crate::error::BackendError;
use crate::objects::{get, resolve};

/// Decode an image XObject into a [`RawImage`].
pub fn decode_image(
    doc: &Document,
    id: ObjectId,
    stream: &Stream,
    bbox: Option<BBox>,
) -> Result<RawImage, BackendError> {
    let dict = &stream.dict;
    let width = dimension(doc, stream, b"Width")?;
    let height = dimension(doc, stream, b"Height")?;
    let source_ref = format!("{} {} R", id.0, id.1);

    let filters = filter_names(doc, stream);
    let last_filter = filters.last().map(Vec::as_slice);
    let (ext, bytes) = match last_filter {
        Some(b"DCTDecode") if filters.len() == 1 => ("jpeg", stream.content.clone()),
        Some(b"JPXDecode") if filters.len() == 1 => ("jpx", stream.content.clone()),
        _ => {
            let samples = if filters.is_empty() {
                stream.content.clone()
            } else {
                stream.decompressed_content().map_err(|e| {
                    BackendError::Interpreter(format!("image {source_ref}: {e}"))
                })?
            };
            let bpc = get(doc, dict, b"BitsPerComponent").and_then(|o| o.as_i64().ok());
            let space = get(doc, dict, b"ColorSpace").and_then(|o| o.as_name().ok());
            match (bpc, space) {
                (Some(8), Some(b"DeviceRGB")) => match encode_png_rgb(width, height, samples) {
                    Ok(png) => ("png", png),
                    Err(samples) => ("bin", samples),
                },
                (Some(8), Some(b"DeviceGray")) => match encode_png_gray(width, height, samples) {
                    Ok(png) => ("png", png),
                    Err(samples) => ("bin", samples),
                },
                _ => ("bin", samples),
            }
        }
    };

    Ok(RawImage {
        source_ref,
        ext: ext.to_string(),
        width,
        height,
        bytes,
        bbox,
    })
}

/// The page-space box of an image drawn under `ctm`.
///
/// Images occupy the unit square of their own space.
pub fn placement(ctm: &Ctm, page_height: f64) -> Option<BBox> {
    let corners: Vec<Point> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
        .iter()
        .map(|&(x, y)| {
            let p = ctm.transform_point(Point::new(x, y));
            Point::new(p.x, flip_y(p.y, page_height))
        })
        .collect();
    BBox::from_points(&corners)
}

fn dimension(doc: &Document, stream: &Stream, key: &[u8]) -> Result<u32, BackendError> {
    get(doc, &stream.dict, key)
        .and_then(|o| o.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| {
            BackendError::Interpreter(format!(
                "image is missing /{}",
                String::from_utf8_lossy(key)
            ))
        })
}

fn filter_names(doc: &Document, stream: &Stream) -> Vec<Vec<u8>> {
    match get(doc, &stream.dict, b"Filter") {
        Some(Object::Name(name)) => vec![name.clone()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|o| resolve(doc, o).as_name().ok())
            .map(<[u8]>::to_vec)
            .collect(),
        _ => Vec::new(),
    }
}

fn encode_png_rgb(width: u32, height: u32, samples: Vec<u8>) -> Result<Vec<u8>, Vec<u8>> {
    let expected = width as usize * height as usize * 3;
    if samples.len() < expected {
        return Err(samples);
    }
    let mut pixels = samples;
    pixels.truncate(expected);
    let buffer = RgbImage::from_raw(width, height, pixels).ok_or_else(Vec::new)?;
    write_png(DynamicImage::ImageRgb8(buffer))
}

fn encode_png_gray(width: u32, height: u32, samples: Vec<u8>) -> Result<Vec<u8>, Vec<u8>> {
    let expected = width as usize * height as usize;
    if samples.len() < expected {
        return Err(samples);
    }
    let mut pixels = samples;
    pixels.truncate(expected);
    let buffer = GrayImage::from_raw(width, height, pixels).ok_or_else(Vec::new)?;
    write_png(DynamicImage::ImageLuma8(buffer))
}

fn write_png(image: DynamicImage) -> Result<Vec<u8>, Vec<u8>> {
    let mut out = Vec::new();
    let written = image.write_to(&mut Cursor::new(&mut out), ImageFormat::Png);
    match written {
        Ok(()) => Ok(out),
        Err(_) => Err(image.into_bytes()),
    }
}
