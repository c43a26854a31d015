//! End-to-end tests: record → reconstruct → extract → edit → reconstruct.
//!
//! Source documents are produced by [`DocumentReconstructor`] or built
//! directly with lopdf.

use std::io::Cursor;

use pdfedit::{
    Align, ColorPalette, DocumentExtractor, DocumentReconstructor, DocumentRecord, Editor,
    ElementKind, ExtractOptions, Fill, HLine, Image, ItemError, PageRecord, PageStage, Placement,
    ReconstructOptions, Rgb, StyleTuple, StyledSpan, TextRun, VLine,
};

// --- Helpers ---

fn png(width: u32, height: u32) -> Vec<u8> {
    let pixels = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(pixels)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn text(x: f64, y: f64, body: &str, font: &str, color_index: usize) -> TextRun {
    TextRun {
        x,
        y,
        w: 200.0,
        color_index,
        align: Align::Left,
        runs: vec![StyledSpan::new(body, StyleTuple::new(font, 11.0, false, false))],
    }
}

/// One page using every element kind.
fn sample_record() -> DocumentRecord {
    let mut palette = ColorPalette::new();
    let black = palette.index_of(Rgb::BLACK);
    let red = palette.index_of(Rgb(0xFF0000));
    let blue = palette.index_of(Rgb(0x0000FF));
    let shade = palette.index_of(Rgb(0xEEEEEE));

    DocumentRecord {
        pages: vec![PageRecord {
            width: Some(612.0),
            height: Some(792.0),
            texts: vec![
                text(20.0, 30.0, "Hello", "helv", black),
                text(20.0, 100.0, "Total due", "Times-Roman", red),
            ],
            images: vec![Image {
                source_ref: "9 0 R".to_string(),
                ext: "png".to_string(),
                width: 4,
                height: 2,
                bytes: png(4, 2),
                bbox: Some(Placement {
                    x: 300.0,
                    y: 400.0,
                    w: 80.0,
                    h: 40.0,
                }),
            }],
            hlines: vec![HLine {
                x: 20.0,
                y: 150.0,
                length: 400.0,
                width: 1.5,
                color_index: red,
                dashed: true,
            }],
            vlines: vec![VLine {
                x: 500.0,
                y: 200.0,
                length: 100.0,
                width: 1.0,
                color_index: blue,
                dashed: false,
            }],
            fills: vec![Fill {
                x: 10.0,
                y: 90.0,
                w: 300.0,
                h: 20.0,
                color_index: shade,
            }],
            ..PageRecord::default()
        }],
        color_palette: palette,
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.5
}

// --- Round trip ---

#[test]
fn hello_round_trips_within_half_a_point() {
    let mut palette = ColorPalette::new();
    palette.index_of(Rgb::BLACK);
    let record = DocumentRecord {
        pages: vec![PageRecord {
            width: Some(612.0),
            height: Some(792.0),
            texts: vec![text(20.0, 30.0, "Hello", "helv", 0)],
            ..PageRecord::default()
        }],
        color_palette: palette,
    };
    let bytes = DocumentReconstructor::<pdfedit::LopdfWriter>::default()
        .reconstruct(record)
        .unwrap()
        .bytes;

    let extraction = DocumentExtractor::<pdfedit::LopdfEngine>::default()
        .extract(&bytes)
        .unwrap();
    assert!(extraction.report.is_clean());
    let page = &extraction.document.pages[0];
    assert_eq!(page.page_number, 1);
    assert_eq!((page.width, page.height), (612.0, 792.0));
    assert_eq!(page.texts.len(), 1);

    let run = &page.texts[0];
    assert_eq!(run.text(), "Hello");
    assert!(close(run.x, 20.0), "x = {}", run.x);
    assert!(close(run.y, 30.0), "y = {}", run.y);
    let style = &run.runs[0].style;
    assert_eq!(style.font_name, "Helvetica");
    assert_eq!(style.size, 11.0);
    assert!(!style.bold && !style.italic);
    assert_eq!(extraction.document.color_palette.color_at(run.color_index), Some(Rgb::BLACK));
}

#[test]
fn every_element_kind_survives_a_round_trip() {
    let bytes = DocumentReconstructor::<pdfedit::LopdfWriter>::default()
        .reconstruct(sample_record())
        .unwrap()
        .bytes;
    let extraction = DocumentExtractor::<pdfedit::LopdfEngine>::default()
        .extract(&bytes)
        .unwrap();
    assert!(extraction.report.is_clean(), "{}", extraction.report);
    let doc = &extraction.document;
    let page = &doc.pages[0];
    let color = |index: usize| doc.color_palette.color_at(index);

    let texts: Vec<String> = page.texts.iter().map(|t| t.text()).collect();
    assert_eq!(texts, vec!["Hello", "Total due"]);
    assert_eq!(page.texts[1].runs[0].style.font_name, "Times-Roman");
    assert_eq!(color(page.texts[1].color_index), Some(Rgb(0xFF0000)));
    assert!(close(page.texts[1].y, 100.0));

    assert_eq!(page.fills.len(), 1);
    let fill = &page.fills[0];
    assert!(close(fill.x, 10.0) && close(fill.y, 90.0));
    assert!(close(fill.w, 300.0) && close(fill.h, 20.0));
    assert_eq!(color(fill.color_index), Some(Rgb(0xEEEEEE)));

    assert_eq!(page.hlines.len(), 1);
    let hline = &page.hlines[0];
    assert!(close(hline.x, 20.0) && close(hline.y, 150.0) && close(hline.length, 400.0));
    assert!(close(hline.width, 1.5));
    assert!(hline.dashed);

    assert_eq!(page.vlines.len(), 1);
    let vline = &page.vlines[0];
    assert!(close(vline.x, 500.0) && close(vline.y, 200.0) && close(vline.length, 100.0));
    assert!(!vline.dashed);
    assert_eq!(color(vline.color_index), Some(Rgb(0x0000FF)));

    assert_eq!(page.images.len(), 1);
    let image = &page.images[0];
    assert_eq!(image.ext, "png");
    assert_eq!((image.width, image.height), (4, 2));
    let bbox = image.bbox.unwrap();
    assert!(close(bbox.x, 300.0) && close(bbox.y, 400.0));
    assert!(close(bbox.w, 80.0) && close(bbox.h, 40.0));

    // Text colors are registered before drawing colors.
    assert_eq!(doc.color_palette.color_at(0), Some(Rgb::BLACK));
    assert_eq!(doc.color_palette.color_at(1), Some(Rgb(0xFF0000)));
    assert_eq!(doc.color_palette.len(), 4);
}

#[test]
fn element_cap_keeps_the_first_items_and_reports_the_rest() {
    let bytes = DocumentReconstructor::<pdfedit::LopdfWriter>::default()
        .reconstruct(sample_record())
        .unwrap()
        .bytes;
    let extraction = DocumentExtractor::<pdfedit::LopdfEngine>::new(ExtractOptions {
        max_elements_per_page: 1,
        ..ExtractOptions::default()
    })
    .extract(&bytes)
    .unwrap();

    let page = &extraction.document.pages[0];
    assert_eq!(page.texts.len(), 1);
    assert_eq!(page.texts[0].text(), "Hello");
    assert_eq!(page.images.len(), 1);

    let text_items: Vec<&ItemError> = extraction
        .report
        .for_page(0)
        .filter(|e| matches!(e, ItemError::PageExtraction { stage: PageStage::Text, .. }))
        .collect();
    assert_eq!(text_items.len(), 1);
    assert_eq!(
        text_items[0].reason(),
        "1 item(s) past the per-page limit of 1 dropped"
    );
    assert!(extraction.report.skipped().iter().any(|e| matches!(
        e,
        ItemError::PageExtraction { stage: PageStage::Drawings, .. }
    )));
}

#[test]
fn edited_record_is_rewritten() {
    let editor = Editor::new();
    let original = editor.reconstruct(sample_record()).unwrap().bytes;
    let extraction = editor.extract(&original).unwrap();

    let mut record: DocumentRecord = extraction.document.into();
    let page = &mut record.pages[0];
    page.texts[0].runs[0].text = "Goodbye".to_string();
    page.texts[1].align = Align::Right;
    page.vlines.clear();
    page.fills[0].color_index = record.color_palette.index_of(Rgb(0x00FF00));

    let rebuilt = editor.reconstruct(record).unwrap();
    assert!(rebuilt.report.is_clean());
    let again = editor.extract(&rebuilt.bytes).unwrap().document;
    let page = &again.pages[0];
    assert_eq!(page.texts[0].text(), "Goodbye");
    assert!(page.vlines.is_empty());
    assert_eq!(
        again.color_palette.color_at(page.fills[0].color_index),
        Some(Rgb(0x00FF00))
    );
    // Right-aligned within its original box: ends at the box's right edge.
    let total = &page.texts[1];
    let original_box = &editor.list_history()[0].pages[0].texts[1];
    assert!(close(total.x + total.w, original_box.x + original_box.w));

    assert_eq!(editor.list_history().len(), 2);
}

#[test]
fn uncompressed_output_is_readable() {
    let reconstructor = DocumentReconstructor::<pdfedit::LopdfWriter>::new(ReconstructOptions {
        compress: false,
        ..ReconstructOptions::default()
    });
    let bytes = reconstructor.reconstruct(sample_record()).unwrap().bytes;
    let haystack = String::from_utf8_lossy(&bytes);
    assert!(haystack.contains("(Hello) Tj"));

    let extraction = DocumentExtractor::<pdfedit::LopdfEngine>::default()
        .extract(&bytes)
        .unwrap();
    assert_eq!(extraction.document.pages[0].texts.len(), 2);
}

// --- Degradation ---

#[test]
fn image_without_rectangle_is_skipped_but_document_is_written() {
    let mut record = sample_record();
    record.pages[0].images[0].bbox = None;
    let out = DocumentReconstructor::<pdfedit::LopdfWriter>::default()
        .reconstruct(record)
        .unwrap();
    assert_eq!(out.report.len(), 1);
    assert_eq!(out.report.skipped()[0].reason(), "no placement rectangle");

    let extraction = DocumentExtractor::<pdfedit::LopdfEngine>::default()
        .extract(&out.bytes)
        .unwrap();
    let page = &extraction.document.pages[0];
    assert!(page.images.is_empty());
    assert_eq!(page.texts.len(), 2);
}

#[test]
fn json_record_with_an_invalid_page() {
    let json = r##"{
        "pages": [
            {"height": 792},
            {"width": 300, "height": 200,
             "texts": [{"x": 10, "y": 10, "w": 50, "colorIndex": 0,
                        "runs": [{"text": "Only page", "style": {"fontName": "Arial", "size": 12, "bold": true, "italic": false}}]}]}
        ],
        "colorPalette": {"#000000": 0}
    }"##;
    let record = DocumentRecord::from_json(json).unwrap();
    let out = Editor::new().reconstruct(record).unwrap();
    assert_eq!(out.report.len(), 1);
    assert!(matches!(out.report.skipped()[0], ItemError::Validation { page: 0, .. }));

    let doc = DocumentExtractor::<pdfedit::LopdfEngine>::default()
        .extract(&out.bytes)
        .unwrap()
        .document;
    assert_eq!(doc.pages.len(), 1);
    assert_eq!((doc.pages[0].width, doc.pages[0].height), (300.0, 200.0));
    let style = &doc.pages[0].texts[0].runs[0].style;
    assert_eq!(style.font_name, "Helvetica-Bold");
    assert!(style.bold);
}

#[test]
fn json_record_with_an_unreadable_text_run() {
    let json = r##"{
        "pages": [
            {"width": 300, "height": 200,
             "texts": [{"x": 10, "y": 10, "w": 80, "colorIndex": 0,
                        "runs": [{"text": "First page", "style": {"fontName": "Arial", "size": 12, "bold": false, "italic": false}}]}]},
            {"width": 300, "height": 200,
             "texts": [{"y": 10, "w": 80, "colorIndex": 0,
                        "runs": [{"text": "No x", "style": {"fontName": "Arial", "size": 12, "bold": false, "italic": false}}]},
                       {"x": 10, "y": 60, "w": 80, "colorIndex": 0,
                        "runs": [{"text": "Kept", "style": {"fontName": "Arial", "size": 12, "bold": false, "italic": false}}]}],
             "hlines": [{"x": 10, "y": 100, "length": 200, "width": 1, "colorIndex": 0}]}
        ],
        "colorPalette": {"#000000": 0}
    }"##;
    let record = DocumentRecord::from_json(json).unwrap();
    let out = Editor::new().reconstruct(record).unwrap();
    assert_eq!(out.report.len(), 1);
    assert!(matches!(
        &out.report.skipped()[0],
        ItemError::ElementPlacement { page: 1, element: ElementKind::Text, index: 0, reason }
            if reason.contains("missing field `x`")
    ));

    let doc = DocumentExtractor::<pdfedit::LopdfEngine>::default()
        .extract(&out.bytes)
        .unwrap()
        .document;
    assert_eq!(doc.pages.len(), 2);
    assert_eq!(doc.pages[0].texts[0].text(), "First page");
    let texts: Vec<String> = doc.pages[1].texts.iter().map(|t| t.text()).collect();
    assert_eq!(texts, ["Kept"]);
    assert_eq!(doc.pages[1].hlines.len(), 1);
}

#[test]
fn malformed_contents_leave_page_lists_empty() {
    use lopdf::{Object, dictionary};

    let mut doc = lopdf::Document::with_version("1.5");
    // /Contents must be a stream or an array of streams.
    let content_id = doc.add_object(Object::Integer(7));
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 200.into(), 100.into()],
        "Contents" => Object::Reference(content_id),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();

    let extraction = DocumentExtractor::<pdfedit::LopdfEngine>::new(ExtractOptions::default())
        .extract(&bytes)
        .unwrap();
    let page = &extraction.document.pages[0];
    assert_eq!((page.width, page.height), (200.0, 100.0));
    assert_eq!(page.element_count(), 0);
    let stages: Vec<PageStage> = extraction
        .report
        .skipped()
        .iter()
        .filter_map(|e| match e {
            ItemError::PageExtraction { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();
    assert!(stages.contains(&PageStage::Text));
    assert!(stages.contains(&PageStage::Drawings));
}
