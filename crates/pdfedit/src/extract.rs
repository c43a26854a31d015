//! Extraction: document bytes to the edit-friendly model.

use std::fmt::Display;
use std::marker::PhantomData;

use pdfedit_core::text_style::styled_span;
use pdfedit_core::vector::{self, Vector};
use pdfedit_core::{
    ColorPalette, Document, ExtractOptions, Image, ItemError, Page, PageStage, PdfEditError,
    Placement, RawImage, RawSpan, TextRun,
};
use pdfedit_parse::{DocumentEngine, LopdfEngine, PageItems};
use tracing::debug;

use crate::degrade::{Degrade, Outcome, Report};

/// An extracted document and the page reads that were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub document: Document,
    pub report: Report,
}

fn stage_error(page: usize, stage: PageStage, err: impl Display) -> ItemError {
    ItemError::PageExtraction {
        page,
        stage,
        reason: err.to_string(),
    }
}

/// Builds one [`Page`] from an opened document.
///
/// Each of the four reads (size, text, images, drawings) is attempted on its
/// own. A failed text, image or drawing read leaves that list empty; a
/// failed size read skips the page, since a page without dimensions cannot
/// be reconstructed.
pub struct PageExtractor<'a, E: DocumentEngine> {
    doc: &'a E::Document,
    options: &'a ExtractOptions,
}

impl<'a, E: DocumentEngine> PageExtractor<'a, E> {
    pub fn new(doc: &'a E::Document, options: &'a ExtractOptions) -> Self {
        Self { doc, options }
    }

    /// Extract page `index` (0-based).
    ///
    /// Colors are registered in `palette` in read order: text first, then
    /// drawings.
    pub fn extract(
        &self,
        index: usize,
        palette: &mut ColorPalette,
        degrade: &mut Degrade,
    ) -> Outcome<Page> {
        let size = degrade.attempt(|| {
            E::page_size(self.doc, index).map_err(|e| stage_error(index, PageStage::Size, e))
        });
        let (width, height) = match size {
            Outcome::Done(size) => size,
            Outcome::Skipped(err) => return Outcome::Skipped(err),
        };
        let mut page = Page::new(index as u32 + 1, width, height);

        let spans = self.read(index, PageStage::Text, degrade, || {
            E::text_spans(self.doc, index, self.options)
        });
        for span in &spans {
            if let Some(run) = text_run(span, &mut page, palette) {
                page.texts.push(run);
            }
        }

        page.images = self
            .read(index, PageStage::Images, degrade, || {
                E::raster_images(self.doc, index, self.options)
            })
            .into_iter()
            .map(image)
            .collect();

        let drawings = self.read(index, PageStage::Drawings, degrade, || {
            E::drawing_primitives(self.doc, index, self.options)
        });
        for drawing in &drawings {
            match vector::classify(drawing, palette) {
                Some(Vector::Horizontal(line)) => page.hlines.push(line),
                Some(Vector::Vertical(line)) => page.vlines.push(line),
                Some(Vector::Fill(fill)) => page.fills.push(fill),
                None => {}
            }
        }

        Outcome::Done(page)
    }

    /// Run one list read. A failed read gives an empty list; a read cut
    /// short by the per-page cap keeps its items and is reported as well.
    fn read<T>(
        &self,
        index: usize,
        stage: PageStage,
        degrade: &mut Degrade,
        read: impl FnOnce() -> Result<PageItems<T>, E::Error>,
    ) -> Vec<T> {
        let items = degrade
            .attempt(|| read().map_err(|e| stage_error(index, stage, e)))
            .or_empty();
        if items.is_truncated() {
            let reason = format!(
                "{} item(s) past the per-page limit of {} dropped",
                items.dropped, self.options.max_elements_per_page
            );
            degrade.skip(stage_error(index, stage, reason));
        }
        items.items
    }
}

/// One text run per span with text, recording its style on the page.
///
/// Whitespace-only spans are kept; callers that do not want them filter
/// on [`TextRun::text`].
fn text_run(span: &RawSpan, page: &mut Page, palette: &mut ColorPalette) -> Option<TextRun> {
    if span.text.is_empty() {
        return None;
    }
    let styled = styled_span(span);
    page.style_palette.record(&styled.style);
    Some(TextRun {
        x: span.bbox.x0,
        y: span.bbox.top,
        w: span.bbox.width(),
        color_index: palette.index_of(span.color),
        align: Default::default(),
        runs: vec![styled],
    })
}

fn image(raw: RawImage) -> Image {
    Image {
        source_ref: raw.source_ref,
        ext: raw.ext,
        width: raw.width,
        height: raw.height,
        bytes: raw.bytes,
        bbox: raw.bbox.map(|b| Placement {
            x: b.x0,
            y: b.top,
            w: b.width(),
            h: b.height(),
        }),
    }
}

/// Opens documents and extracts every page.
///
/// The engine defaults to [`LopdfEngine`].
pub struct DocumentExtractor<E: DocumentEngine = LopdfEngine> {
    options: ExtractOptions,
    _engine: PhantomData<fn() -> E>,
}

impl<E: DocumentEngine> Default for DocumentExtractor<E> {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}

impl<E: DocumentEngine> std::fmt::Debug for DocumentExtractor<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentExtractor")
            .field("options", &self.options)
            .finish()
    }
}

impl<E: DocumentEngine> DocumentExtractor<E> {
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            options,
            _engine: PhantomData,
        }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract a document from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PdfEditError::ResourceLimitExceeded`] if the input is larger
    /// than `max_input_bytes` or has more than `max_pages` pages, and
    /// [`PdfEditError::ParseError`] if the bytes cannot be opened. Failures
    /// inside a page are reported in [`Extraction::report`] instead.
    pub fn extract(&self, bytes: &[u8]) -> Result<Extraction, PdfEditError> {
        if let Some(max_bytes) = self.options.max_input_bytes {
            if bytes.len() > max_bytes {
                return Err(PdfEditError::ResourceLimitExceeded {
                    limit_name: "max_input_bytes".to_string(),
                    limit_value: max_bytes,
                    actual_value: bytes.len(),
                });
            }
        }

        let doc = E::open(bytes).map_err(Into::<PdfEditError>::into)?;
        let page_count = E::page_count(&doc);
        if let Some(max_pages) = self.options.max_pages {
            if page_count > max_pages {
                return Err(PdfEditError::ResourceLimitExceeded {
                    limit_name: "max_pages".to_string(),
                    limit_value: max_pages,
                    actual_value: page_count,
                });
            }
        }
        debug!(pages = page_count, bytes = bytes.len(), "opened document");

        let mut palette = ColorPalette::new();
        let mut degrade = Degrade::new();
        let extractor = PageExtractor::<E>::new(&doc, &self.options);
        let pages: Vec<Page> = (0..page_count)
            .filter_map(|index| extractor.extract(index, &mut palette, &mut degrade).done())
            .collect();

        let document = Document {
            pages,
            color_palette: palette,
        };
        let report = degrade.into_report();
        debug!(
            pages = document.pages.len(),
            elements = document.element_count(),
            colors = document.color_palette.len(),
            skipped = report.len(),
            "extracted document"
        );
        Ok(Extraction { document, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfedit_core::{BBox, Point, RawDrawing, Rgb};
    use pdfedit_parse::BackendError;

    /// What one mock page returns from each read.
    #[derive(Default, Clone)]
    struct MockPage {
        size_fails: bool,
        spans: Vec<RawSpan>,
        drawings: Option<Vec<RawDrawing>>,
        images: Vec<RawImage>,
    }

    /// An engine whose pages are scripted; `drawings: None` makes the
    /// drawing read fail.
    struct MockEngine;

    impl DocumentEngine for MockEngine {
        type Document = Vec<MockPage>;
        type Error = BackendError;

        fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error> {
            if bytes.starts_with(b"%PDF") {
                Ok(scripted_pages())
            } else {
                Err(BackendError::Parse("not a PDF".to_string()))
            }
        }

        fn page_count(doc: &Self::Document) -> usize {
            doc.len()
        }

        fn page_size(doc: &Self::Document, index: usize) -> Result<(f64, f64), Self::Error> {
            if doc[index].size_fails {
                return Err(BackendError::Parse("MediaBox is not an array".to_string()));
            }
            Ok((612.0, 792.0))
        }

        fn text_spans(
            doc: &Self::Document,
            index: usize,
            options: &ExtractOptions,
        ) -> Result<PageItems<RawSpan>, Self::Error> {
            let spans = &doc[index].spans;
            let kept = spans.len().min(options.max_elements_per_page);
            Ok(PageItems::new(spans[..kept].to_vec(), spans.len() - kept))
        }

        fn drawing_primitives(
            doc: &Self::Document,
            index: usize,
            _options: &ExtractOptions,
        ) -> Result<PageItems<RawDrawing>, Self::Error> {
            doc[index]
                .drawings
                .clone()
                .map(PageItems::from)
                .ok_or_else(|| BackendError::Interpreter("corrupt path operator".to_string()))
        }

        fn raster_images(
            doc: &Self::Document,
            index: usize,
            _options: &ExtractOptions,
        ) -> Result<PageItems<RawImage>, Self::Error> {
            Ok(doc[index].images.clone().into())
        }
    }

    fn span(text: &str, font: &str, flags: u32, color: Rgb) -> RawSpan {
        RawSpan {
            bbox: BBox::new(72.0, 90.0, 120.0, 102.0),
            font: font.to_string(),
            size: 12.0,
            flags,
            color,
            text: text.to_string(),
        }
    }

    fn scripted_pages() -> Vec<MockPage> {
        let rule = RawDrawing::segment(Point::new(0.0, 10.0), Point::new(50.0, 10.0))
            .with_stroke(Rgb(0x00FF00), 1.0);
        let column = RawDrawing::segment(Point::new(10.0, 0.0), Point::new(10.0, 50.0))
            .with_stroke(Rgb(0xFF0000), 1.0);
        let diagonal = RawDrawing::segment(Point::new(0.0, 0.0), Point::new(50.0, 50.0))
            .with_stroke(Rgb::BLACK, 1.0);
        let shade = RawDrawing::rect(BBox::new(0.0, 0.0, 20.0, 20.0)).with_fill(Rgb(0xEEEEEE));
        vec![
            MockPage {
                spans: vec![
                    span("Title", "Arial-BoldMT", 0, Rgb(0xFF0000)),
                    span("   ", "Arial", 0, Rgb(0x0000FF)),
                    span("body", "Foo", 2, Rgb::BLACK),
                ],
                drawings: Some(vec![rule, column, diagonal, shade]),
                images: vec![RawImage {
                    source_ref: "9 0 R".to_string(),
                    ext: "png".to_string(),
                    width: 4,
                    height: 2,
                    bytes: vec![1, 2, 3],
                    bbox: Some(BBox::new(10.0, 20.0, 50.0, 40.0)),
                }],
                ..MockPage::default()
            },
            MockPage {
                spans: vec![span("kept", "Helvetica", 0, Rgb::BLACK)],
                drawings: None,
                ..MockPage::default()
            },
            MockPage {
                size_fails: true,
                ..MockPage::default()
            },
            MockPage {
                spans: vec![span("last", "Times-Italic", 0, Rgb::BLACK)],
                drawings: Some(Vec::new()),
                ..MockPage::default()
            },
        ]
    }

    fn extract() -> Extraction {
        DocumentExtractor::<MockEngine>::default()
            .extract(b"%PDF-1.7")
            .unwrap()
    }

    #[test]
    fn page_is_assembled_from_all_reads() {
        let doc = extract().document;
        let page = &doc.pages[0];
        assert_eq!(page.page_number, 1);
        assert_eq!((page.width, page.height), (612.0, 792.0));

        assert_eq!(page.texts.len(), 3);
        let title = &page.texts[0];
        assert_eq!((title.x, title.y, title.w), (72.0, 90.0, 48.0));
        assert_eq!(title.runs.len(), 1);
        assert!(title.runs[0].style.bold);
        assert_eq!(page.texts[1].text(), "   ");
        assert!(page.texts[2].runs[0].style.bold);

        assert_eq!(page.hlines.len(), 1);
        assert_eq!(page.vlines.len(), 1);
        assert_eq!(page.fills.len(), 1);
        assert_eq!(page.style_palette.len(), 3);

        let image = &page.images[0];
        assert_eq!(image.ext, "png");
        assert_eq!(image.bytes, vec![1, 2, 3]);
        assert_eq!(
            image.bbox,
            Some(Placement {
                x: 10.0,
                y: 20.0,
                w: 40.0,
                h: 20.0
            })
        );
    }

    #[test]
    fn failed_drawing_read_leaves_only_vector_lists_empty() {
        let extraction = extract();
        let page = &extraction.document.pages[1];
        assert_eq!(page.texts.len(), 1);
        assert!(page.hlines.is_empty());
        assert!(page.vlines.is_empty());
        assert!(page.fills.is_empty());

        let skipped: Vec<_> = extraction.report.for_page(1).collect();
        assert_eq!(skipped.len(), 1);
        assert!(matches!(
            skipped[0],
            ItemError::PageExtraction {
                stage: PageStage::Drawings,
                ..
            }
        ));
    }

    #[test]
    fn failed_size_read_skips_only_that_page() {
        let extraction = extract();
        let numbers: Vec<u32> = extraction
            .document
            .pages
            .iter()
            .map(|p| p.page_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 4]);
        assert_eq!(extraction.report.len(), 2);
        assert!(extraction.document.pages[2].texts[0].runs[0].style.italic);
    }

    #[test]
    fn palette_indices_follow_read_order() {
        let doc = extract().document;
        let entries: Vec<(Rgb, usize)> = doc.color_palette.iter().collect();
        assert_eq!(
            entries,
            vec![
                (Rgb(0xFF0000), 0),
                (Rgb(0x0000FF), 1),
                (Rgb::BLACK, 2),
                (Rgb(0x00FF00), 3),
                (Rgb(0xEEEEEE), 4),
            ]
        );
        // The diagonal adds no entry.
        assert_eq!(doc.color_palette.len(), 5);
        for page in &doc.pages {
            assert!(page.color_indices().all(|i| i < doc.color_palette.len()));
        }
    }

    #[test]
    fn same_input_gives_same_palette() {
        assert_eq!(extract().document.color_palette, extract().document.color_palette);
    }

    #[test]
    fn open_failure_is_a_parse_error() {
        let err = DocumentExtractor::<MockEngine>::default()
            .extract(b"garbage")
            .unwrap_err();
        assert!(matches!(err, PdfEditError::ParseError(_)));
    }

    #[test]
    fn resource_limits() {
        let small = DocumentExtractor::<MockEngine>::new(ExtractOptions {
            max_input_bytes: Some(4),
            ..ExtractOptions::default()
        });
        assert!(matches!(
            small.extract(b"%PDF-1.7"),
            Err(PdfEditError::ResourceLimitExceeded { .. })
        ));

        let few_pages = DocumentExtractor::<MockEngine>::new(ExtractOptions {
            max_pages: Some(2),
            ..ExtractOptions::default()
        });
        let err = few_pages.extract(b"%PDF-1.7").unwrap_err();
        assert_eq!(
            err,
            PdfEditError::ResourceLimitExceeded {
                limit_name: "max_pages".to_string(),
                limit_value: 2,
                actual_value: 4,
            }
        );
    }

    #[test]
    fn fill_keeps_rect_geometry() {
        let doc = extract().document;
        let fill = &doc.pages[0].fills[0];
        assert_eq!((fill.x, fill.y, fill.w, fill.h), (0.0, 0.0, 20.0, 20.0));
        assert_eq!(fill.color_index, 4);
    }

    #[test]
    fn capped_read_keeps_items_and_is_reported() {
        let extraction = DocumentExtractor::<MockEngine>::new(ExtractOptions {
            max_elements_per_page: 1,
            ..ExtractOptions::default()
        })
        .extract(b"%PDF-1.7")
        .unwrap();
        let page = &extraction.document.pages[0];
        assert_eq!(page.texts.len(), 1);
        assert_eq!(page.texts[0].text(), "Title");
        assert_eq!(page.fills.len(), 1);

        let skipped: Vec<_> = extraction.report.for_page(0).collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(
            skipped[0].to_string(),
            "page 0: text extraction failed: 2 item(s) past the per-page limit of 1 dropped"
        );
    }
}
