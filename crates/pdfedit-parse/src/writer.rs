//! lopdf-backed [`DocumentWriter`] implementation.
//!
//! Text is written with the 14 standard Type1 faces only, so the output
//! needs no embedded font programs. Images are embedded as JPEG
//! (`DCTDecode`) when the input already is one, and as Flate-compressed RGB
//! samples otherwise.

use std::collections::BTreeMap;
use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::ColorType;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat, dictionary};
use pdfedit_core::{Placement, ReconstructOptions, Rgb};

use crate::backend::{DocumentWriter, LinePlacement, TextPlacement};
use crate::encoding::win_ansi_encode;
use crate::error::BackendError;
use crate::standard_fonts::{self, StandardFontData, has_builtin_encoding};

/// Handle of a page inside a [`LopdfWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterPage(usize);

#[derive(Debug)]
struct PageBuilder {
    width: f64,
    height: f64,
    operations: Vec<Operation>,
    /// Font resource name by face.
    fonts: BTreeMap<String, String>,
    /// XObject resource name to image object.
    xobjects: BTreeMap<String, ObjectId>,
}

impl PageBuilder {
    /// Convert a top-left-origin y coordinate to PDF user space.
    fn flip(&self, y: f64) -> f64 {
        self.height - y
    }
}

/// Builds a new document page by page.
pub struct LopdfWriter {
    doc: lopdf::Document,
    pages: Vec<PageBuilder>,
    /// Shared font objects by face.
    fonts: BTreeMap<String, ObjectId>,
}

impl std::fmt::Debug for LopdfWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfWriter")
            .field("page_count", &self.pages.len())
            .field("fonts", &self.fonts.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl LopdfWriter {
    fn page_mut(&mut self, page: WriterPage) -> Result<&mut PageBuilder, BackendError> {
        self.pages
            .get_mut(page.0)
            .ok_or_else(|| BackendError::Placement(format!("no page with handle {}", page.0)))
    }

    /// Font resource name for `face` on `page`, adding the font object on
    /// first use.
    fn font_resource(&mut self, page: WriterPage, face: &str) -> Result<String, BackendError> {
        self.page_mut(page)?;
        if !self.fonts.contains_key(face) {
            let mut font = dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => Object::Name(face.as_bytes().to_vec()),
            };
            if !has_builtin_encoding(face) {
                font.set("Encoding", "WinAnsiEncoding");
            }
            let id = self.doc.add_object(font);
            self.fonts.insert(face.to_string(), id);
        }
        let builder = self.page_mut(page)?;
        if let Some(name) = builder.fonts.get(face) {
            return Ok(name.clone());
        }
        let name = format!("F{}", builder.fonts.len() + 1);
        builder.fonts.insert(face.to_string(), name.clone());
        Ok(name)
    }
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn color_operands(color: Rgb) -> Vec<Object> {
    color.components().into_iter().map(Object::Real).collect()
}

fn standard_face(face: &str) -> Result<&'static StandardFontData, BackendError> {
    standard_fonts::lookup(face)
        .ok_or_else(|| BackendError::Placement(format!("{face} is not a standard base font")))
}

/// Encode `text` as single-byte codes for a standard face.
fn encode_text(face: &str, text: &str) -> Result<Vec<u8>, BackendError> {
    let builtin = has_builtin_encoding(face);
    text.chars()
        .map(|ch| {
            let code = if builtin {
                u8::try_from(u32::from(ch)).ok()
            } else {
                win_ansi_encode(ch)
            };
            code.ok_or_else(|| {
                BackendError::Placement(format!("{ch:?} cannot be encoded in {face}"))
            })
        })
        .collect()
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, BackendError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Build the image XObject (and soft mask, if any) for encoded image bytes.
fn image_streams(ext: &str, bytes: &[u8]) -> Result<(Stream, Option<Stream>), BackendError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| BackendError::Placement(format!("cannot decode {ext} image: {e}")))?;
    let (width, height) = (i64::from(decoded.width()), i64::from(decoded.height()));

    let passthrough = matches!(ext.to_ascii_lowercase().as_str(), "jpeg" | "jpg")
        && matches!(decoded.color(), ColorType::L8 | ColorType::Rgb8);
    if passthrough {
        let space = if decoded.color() == ColorType::L8 {
            "DeviceGray"
        } else {
            "DeviceRGB"
        };
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        };
        return Ok((Stream::new(dict, bytes.to_vec()).with_compression(false), None));
    }

    let smask = if decoded.color().has_alpha() {
        let alpha: Vec<u8> = decoded.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        Some(Stream::new(dict, deflate(&alpha)?).with_compression(false))
    } else {
        None
    };

    let rgb = decoded.to_rgb8().into_raw();
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width,
        "Height" => height,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };
    Ok((Stream::new(dict, deflate(&rgb)?).with_compression(false), smask))
}

impl DocumentWriter for LopdfWriter {
    type Page = WriterPage;
    type Error = BackendError;

    fn new_document() -> Self {
        Self {
            doc: lopdf::Document::with_version("1.7"),
            pages: Vec::new(),
            fonts: BTreeMap::new(),
        }
    }

    fn new_page(&mut self, width: f64, height: f64) -> WriterPage {
        self.pages.push(PageBuilder {
            width,
            height,
            operations: Vec::new(),
            fonts: BTreeMap::new(),
            xobjects: BTreeMap::new(),
        });
        WriterPage(self.pages.len() - 1)
    }

    fn place_text(&mut self, page: WriterPage, text: &TextPlacement<'_>) -> Result<(), BackendError> {
        standard_face(text.face)?;
        if !(text.size.is_finite() && text.size > 0.0) {
            return Err(BackendError::Placement(format!(
                "font size {} is not positive",
                text.size
            )));
        }
        let encoded = encode_text(text.face, text.text)?;
        if encoded.is_empty() {
            return Ok(());
        }
        let font = self.font_resource(page, text.face)?;
        let builder = self.page_mut(page)?;
        let baseline = builder.flip(text.baseline);
        builder.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(font.into_bytes()), real(text.size)]),
            Operation::new("rg", color_operands(text.color)),
            Operation::new("Td", vec![real(text.x), real(baseline)]),
            Operation::new("Tj", vec![Object::String(encoded, StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
        Ok(())
    }

    fn place_line(&mut self, page: WriterPage, line: &LinePlacement<'_>) -> Result<(), BackendError> {
        if !(line.width.is_finite() && line.width >= 0.0) {
            return Err(BackendError::Placement(format!(
                "line width {} is negative",
                line.width
            )));
        }
        let builder = self.page_mut(page)?;
        let (y0, y1) = (builder.flip(line.from.y), builder.flip(line.to.y));
        builder.operations.push(Operation::new("q", vec![]));
        builder
            .operations
            .push(Operation::new("RG", color_operands(line.color)));
        builder
            .operations
            .push(Operation::new("w", vec![real(line.width)]));
        if let Some(dash) = line.dash {
            let array = dash.array.iter().copied().map(real).collect::<Vec<_>>();
            builder
                .operations
                .push(Operation::new("d", vec![Object::Array(array), real(dash.phase)]));
        }
        builder.operations.extend([
            Operation::new("m", vec![real(line.from.x), real(y0)]),
            Operation::new("l", vec![real(line.to.x), real(y1)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn place_rect(&mut self, page: WriterPage, rect: &Placement, fill: Rgb) -> Result<(), BackendError> {
        let builder = self.page_mut(page)?;
        let bottom = builder.flip(rect.y + rect.h);
        builder.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", color_operands(fill)),
            Operation::new(
                "re",
                vec![real(rect.x), real(bottom), real(rect.w), real(rect.h)],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn place_image(
        &mut self,
        page: WriterPage,
        rect: &Placement,
        ext: &str,
        bytes: &[u8],
    ) -> Result<(), BackendError> {
        // Check the handle before adding objects for an unknown page.
        self.page_mut(page)?;
        let (mut stream, smask) = image_streams(ext, bytes)?;
        if let Some(mask) = smask {
            let mask_id = self.doc.add_object(mask);
            stream.dict.set("SMask", mask_id);
        }
        let image_id = self.doc.add_object(stream);

        let builder = self.page_mut(page)?;
        let name = format!("Im{}", builder.xobjects.len() + 1);
        builder.xobjects.insert(name.clone(), image_id);
        let bottom = builder.flip(rect.y + rect.h);
        builder.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(rect.w),
                    real(0.0),
                    real(0.0),
                    real(rect.h),
                    real(rect.x),
                    real(bottom),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn measure(&self, face: &str, size: f64, text: &str) -> Result<f64, BackendError> {
        let data = standard_face(face)?;
        let units: f64 = encode_text(face, text)?
            .into_iter()
            .map(|code| data.width(code))
            .sum();
        Ok(units * size / 1000.0)
    }

    fn ascent(&self, face: &str) -> Result<f64, BackendError> {
        Ok(f64::from(standard_face(face)?.ascent))
    }

    fn serialize(self, options: &ReconstructOptions) -> Result<Vec<u8>, BackendError> {
        let LopdfWriter {
            mut doc,
            pages,
            fonts,
        } = self;
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

        for page in pages {
            let content = Content {
                operations: page.operations,
            }
            .encode()
            .map_err(|e| BackendError::Serialize(format!("content stream: {e}")))?;
            let stream = if options.compress {
                let dict = dictionary! { "Filter" => "FlateDecode" };
                Stream::new(dict, deflate(&content)?).with_compression(false)
            } else {
                Stream::new(Dictionary::new(), content).with_compression(false)
            };
            let content_id = doc.add_object(stream);

            let mut font_dict = Dictionary::new();
            for (face, name) in &page.fonts {
                if let Some(&id) = fonts.get(face) {
                    font_dict.set(name.as_bytes().to_vec(), id);
                }
            }
            let mut xobject_dict = Dictionary::new();
            for (name, id) in page.xobjects {
                xobject_dict.set(name.into_bytes(), id);
            }
            let mut resources = Dictionary::new();
            if !font_dict.is_empty() {
                resources.set("Font", font_dict);
            }
            if !xobject_dict.is_empty() {
                resources.set("XObject", xobject_dict);
            }

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), real(page.width), real(page.height)],
                "Contents" => content_id,
                "Resources" => resources,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf)
            .map_err(|e| BackendError::Serialize(e.to_string()))?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DocumentEngine;
    use crate::engine::LopdfEngine;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use pdfedit_core::{DashPattern, DrawingShape, ExtractOptions, Point};
    use std::io::Cursor;

    fn text<'a>(face: &'a str, value: &'a str) -> TextPlacement<'a> {
        TextPlacement {
            x: 72.0,
            baseline: 100.0,
            text: value,
            face,
            size: 12.0,
            color: Rgb(0x336699),
        }
    }

    fn uncompressed() -> ReconstructOptions {
        ReconstructOptions {
            compress: false,
            ..ReconstructOptions::default()
        }
    }

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut out = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn empty_page_serializes() {
        let mut writer = LopdfWriter::new_document();
        writer.new_page(300.0, 400.0);
        let bytes = writer.serialize(&ReconstructOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        let doc = LopdfEngine::open(&bytes).unwrap();
        assert_eq!(LopdfEngine::page_count(&doc), 1);
        assert_eq!(LopdfEngine::page_size(&doc, 0).unwrap(), (300.0, 400.0));
    }

    #[test]
    fn text_reads_back_at_its_baseline() {
        let mut writer = LopdfWriter::new_document();
        let page = writer.new_page(612.0, 792.0);
        writer.place_text(page, &text("Helvetica", "Hello")).unwrap();
        let bytes = writer.serialize(&ReconstructOptions::default()).unwrap();

        let doc = LopdfEngine::open(&bytes).unwrap();
        let spans = LopdfEngine::text_spans(&doc, 0, &ExtractOptions::default()).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Hello");
        assert_eq!(spans[0].font, "Helvetica");
        assert_eq!(spans[0].color, Rgb(0x336699));
        assert!((spans[0].bbox.x0 - 72.0).abs() < 0.01);
        // Helvetica ascent 718.
        assert!((spans[0].bbox.top - (100.0 - 0.718 * 12.0)).abs() < 0.01);
    }

    #[test]
    fn non_ascii_winansi_text() {
        let mut writer = LopdfWriter::new_document();
        let page = writer.new_page(612.0, 792.0);
        writer.place_text(page, &text("Times-Roman", "Caf\u{e9} \u{20ac}5")).unwrap();
        let bytes = writer.serialize(&uncompressed()).unwrap();
        let doc = LopdfEngine::open(&bytes).unwrap();
        let spans = LopdfEngine::text_spans(&doc, 0, &ExtractOptions::default()).unwrap();
        assert_eq!(spans[0].text, "Caf\u{e9} \u{20ac}5");
    }

    #[test]
    fn placement_errors() {
        let mut writer = LopdfWriter::new_document();
        let page = writer.new_page(612.0, 792.0);
        assert!(matches!(
            writer.place_text(page, &text("Arial", "x")),
            Err(BackendError::Placement(_))
        ));
        assert!(matches!(
            writer.place_text(page, &text("Helvetica", "\u{4e2d}")),
            Err(BackendError::Placement(_))
        ));
        let mut zero = text("Helvetica", "x");
        zero.size = 0.0;
        assert!(writer.place_text(page, &zero).is_err());
        assert!(writer
            .place_text(WriterPage(5), &text("Helvetica", "x"))
            .is_err());
    }

    #[test]
    fn measure_uses_standard_widths() {
        let writer = LopdfWriter::new_document();
        // H = 722, i = 222.
        let w = writer.measure("Helvetica", 10.0, "Hi").unwrap();
        assert!((w - 9.44).abs() < 1e-9);
        assert_eq!(writer.measure("Courier", 10.0, "abc").unwrap(), 18.0);
        assert_eq!(writer.ascent("Times-Roman").unwrap(), 683.0);
        assert!(writer.ascent("Comic Sans").is_err());
    }

    #[test]
    fn lines_and_rects_read_back() {
        let mut writer = LopdfWriter::new_document();
        let page = writer.new_page(612.0, 792.0);
        let dash = DashPattern::default();
        writer
            .place_line(
                page,
                &LinePlacement {
                    from: Point::new(72.0, 100.0),
                    to: Point::new(300.0, 100.0),
                    width: 2.0,
                    color: Rgb(0xFF0000),
                    dash: Some(&dash),
                },
            )
            .unwrap();
        let rect = Placement {
            x: 50.0,
            y: 200.0,
            w: 100.0,
            h: 40.0,
        };
        writer.place_rect(page, &rect, Rgb(0x00FF00)).unwrap();
        let bytes = writer.serialize(&ReconstructOptions::default()).unwrap();

        let doc = LopdfEngine::open(&bytes).unwrap();
        let drawings = LopdfEngine::drawing_primitives(&doc, 0, &ExtractOptions::default()).unwrap();
        assert_eq!(drawings.len(), 2);
        assert_eq!(drawings[0].stroke, Some(Rgb(0xFF0000)));
        assert!(drawings[0].dashed);
        match drawings[0].shape {
            DrawingShape::Segment { from, .. } => assert!((from.y - 100.0).abs() < 1e-3),
            DrawingShape::Rect(_) => panic!("expected a segment"),
        }
        assert_eq!(drawings[1].fill, Some(Rgb(0x00FF00)));
        match drawings[1].shape {
            DrawingShape::Rect(bbox) => {
                assert!((bbox.top - 200.0).abs() < 1e-3);
                assert!((bbox.bottom - 240.0).abs() < 1e-3);
            }
            DrawingShape::Segment { .. } => panic!("expected a rect"),
        }
    }

    #[test]
    fn png_image_is_embedded_and_placed() {
        let mut rgba = RgbaImage::new(2, 2);
        for pixel in rgba.pixels_mut() {
            *pixel = Rgba([10, 20, 30, 128]);
        }
        let png = png_bytes(DynamicImage::ImageRgba8(rgba));

        let mut writer = LopdfWriter::new_document();
        let page = writer.new_page(612.0, 792.0);
        let rect = Placement {
            x: 100.0,
            y: 100.0,
            w: 50.0,
            h: 25.0,
        };
        writer.place_image(page, &rect, "png", &png).unwrap();
        let bytes = writer.serialize(&ReconstructOptions::default()).unwrap();

        let doc = LopdfEngine::open(&bytes).unwrap();
        let images = LopdfEngine::raster_images(&doc, 0, &ExtractOptions::default()).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!((images[0].width, images[0].height), (2, 2));
        assert_eq!(images[0].ext, "png");
        let bbox = images[0].bbox.unwrap();
        assert!((bbox.x0 - 100.0).abs() < 1e-3);
        assert!((bbox.top - 100.0).abs() < 1e-3);
        assert!((bbox.bottom - 125.0).abs() < 1e-3);
    }

    #[test]
    fn undecodable_image_is_a_placement_error() {
        let mut writer = LopdfWriter::new_document();
        let page = writer.new_page(612.0, 792.0);
        let rect = Placement {
            x: 0.0,
            y: 0.0,
            w: 10.0,
            h: 10.0,
        };
        let err = writer.place_image(page, &rect, "bin", b"junk").unwrap_err();
        assert!(matches!(err, BackendError::Placement(_)));
    }

    #[test]
    fn compression_shrinks_repetitive_content() {
        let build = |options: &ReconstructOptions| {
            let mut writer = LopdfWriter::new_document();
            let page = writer.new_page(612.0, 792.0);
            for i in 0..50 {
                let mut line = text("Courier", "repeated line of text");
                line.baseline = 20.0 + f64::from(i) * 14.0;
                writer.place_text(page, &line).unwrap();
            }
            writer.serialize(options).unwrap()
        };
        let compressed = build(&ReconstructOptions::default());
        let plain = build(&uncompressed());
        assert!(compressed.len() < plain.len());
    }
}
