//! Reconstruction: an edited model back to document bytes.

use std::fmt::Display;
use std::marker::PhantomData;

use pdfedit_core::{
    Align, ColorPalette, Document, DocumentRecord, ElementKind, FontResolver, ItemError, Page,
    PdfEditError, Placement, Point, ReconstructOptions, ResolvedFont, Rgb, StyledSpan, TextRun,
};
use pdfedit_parse::{DocumentWriter, LinePlacement, LopdfWriter, TextPlacement};
use tracing::debug;

use crate::degrade::{Degrade, Outcome, Report};

/// Reconstructed bytes and the pages and elements that were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    pub bytes: Vec<u8>,
    pub report: Report,
}

/// Re-emits a document from a (possibly edited) record.
///
/// Per page the paint order is fills, lines, images, text, so text stays
/// on top. Each element is placed on its own: one that cannot be placed is
/// reported and skipped.
pub struct DocumentReconstructor<W: DocumentWriter = LopdfWriter> {
    options: ReconstructOptions,
    fonts: FontResolver,
    _writer: PhantomData<fn() -> W>,
}

impl<W: DocumentWriter> Default for DocumentReconstructor<W> {
    fn default() -> Self {
        Self::new(ReconstructOptions::default())
    }
}

impl<W: DocumentWriter> std::fmt::Debug for DocumentReconstructor<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentReconstructor")
            .field("options", &self.options)
            .field("fonts", &self.fonts)
            .finish()
    }
}

/// Where one element sits, for error reporting.
#[derive(Clone, Copy)]
struct ElementRef {
    page: usize,
    element: ElementKind,
    index: usize,
}

impl ElementRef {
    fn error(self, reason: impl Display) -> ItemError {
        ItemError::ElementPlacement {
            page: self.page,
            element: self.element,
            index: self.index,
            reason: reason.to_string(),
        }
    }
}

impl<W: DocumentWriter> DocumentReconstructor<W> {
    pub fn new(options: ReconstructOptions) -> Self {
        Self {
            options,
            fonts: FontResolver::new(),
            _writer: PhantomData,
        }
    }

    /// Use a custom font resolver.
    pub fn with_fonts(mut self, fonts: FontResolver) -> Self {
        self.fonts = fonts;
        self
    }

    /// Reconstruct a document record.
    ///
    /// Pages missing a positive width or height are reported and skipped.
    /// Elements that could not be read from the record are reported
    /// against their page, which is still drawn.
    ///
    /// # Errors
    ///
    /// Returns [`PdfEditError::SerializationError`] if the finished document
    /// cannot be encoded.
    pub fn reconstruct(&self, record: DocumentRecord) -> Result<Reconstruction, PdfEditError> {
        let mut writer = W::new_document();
        let mut degrade = Degrade::new();
        let palette = record.color_palette;
        let mut placed_pages = 0usize;

        for (index, mut page_record) in record.pages.into_iter().enumerate() {
            let rejected = std::mem::take(&mut page_record.rejected);
            let Outcome::Done(page) = degrade.attempt(|| page_record.validate(index)) else {
                continue;
            };
            for element in rejected {
                degrade.skip(element.into_error(index));
            }
            let handle = writer.new_page(page.width, page.height);
            self.place_page(&mut writer, handle, index, &page, &palette, &mut degrade);
            placed_pages += 1;
        }

        let bytes = writer
            .serialize(&self.options)
            .map_err(|e| PdfEditError::SerializationError(e.to_string()))?;
        let report = degrade.into_report();
        debug!(
            pages = placed_pages,
            bytes = bytes.len(),
            skipped = report.len(),
            "reconstructed document"
        );
        Ok(Reconstruction { bytes, report })
    }

    /// Reconstruct an extracted [`Document`] without editing it.
    pub fn reconstruct_document(&self, document: &Document) -> Result<Reconstruction, PdfEditError> {
        self.reconstruct(DocumentRecord::from(document.clone()))
    }

    fn place_page(
        &self,
        writer: &mut W,
        handle: W::Page,
        page_index: usize,
        page: &Page,
        palette: &ColorPalette,
        degrade: &mut Degrade,
    ) {
        let at = |element, index| ElementRef {
            page: page_index,
            element,
            index,
        };

        for (i, fill) in page.fills.iter().enumerate() {
            let el = at(ElementKind::Fill, i);
            degrade.attempt(|| {
                let color = lookup_color(palette, fill.color_index, el)?;
                let rect = Placement {
                    x: fill.x,
                    y: fill.y,
                    w: fill.w,
                    h: fill.h,
                };
                check_rect(&rect, el)?;
                writer.place_rect(handle, &rect, color).map_err(|e| el.error(e))
            });
        }

        let dash = Some(&self.options.dash_pattern);
        for (i, line) in page.hlines.iter().enumerate() {
            let el = at(ElementKind::HLine, i);
            degrade.attempt(|| {
                let placement = LinePlacement {
                    from: Point::new(line.x, line.y),
                    to: Point::new(line.x + line.length, line.y),
                    width: line.width,
                    color: lookup_color(palette, line.color_index, el)?,
                    dash: dash.filter(|_| line.dashed),
                };
                writer.place_line(handle, &placement).map_err(|e| el.error(e))
            });
        }
        for (i, line) in page.vlines.iter().enumerate() {
            let el = at(ElementKind::VLine, i);
            degrade.attempt(|| {
                let placement = LinePlacement {
                    from: Point::new(line.x, line.y),
                    to: Point::new(line.x, line.y + line.length),
                    width: line.width,
                    color: lookup_color(palette, line.color_index, el)?,
                    dash: dash.filter(|_| line.dashed),
                };
                writer.place_line(handle, &placement).map_err(|e| el.error(e))
            });
        }

        for (i, image) in page.images.iter().enumerate() {
            let el = at(ElementKind::Image, i);
            degrade.attempt(|| {
                let rect = image
                    .bbox
                    .ok_or_else(|| el.error("no placement rectangle"))?;
                check_rect(&rect, el)?;
                writer
                    .place_image(handle, &rect, &image.ext, &image.bytes)
                    .map_err(|e| el.error(e))
            });
        }

        for (i, run) in page.texts.iter().enumerate() {
            let el = at(ElementKind::Text, i);
            degrade.attempt(|| {
                let color = lookup_color(palette, run.color_index, el)?;
                self.place_text_run(writer, handle, run, color)
                    .map_err(|e| el.error(e))
            });
        }
    }

    /// Lay the spans of `run` out left to right on one shared baseline.
    ///
    /// Every span is measured before anything is drawn, so a run with an
    /// unplaceable span is skipped whole.
    fn place_text_run(
        &self,
        writer: &mut W,
        handle: W::Page,
        run: &TextRun,
        color: Rgb,
    ) -> Result<(), String> {
        let mut laid_out: Vec<(&StyledSpan, ResolvedFont, f64)> = Vec::with_capacity(run.runs.len());
        let mut baseline_offset = 0.0f64;
        for span in run.runs.iter().filter(|s| !s.text.is_empty()) {
            let style = &span.style;
            if !(style.size.is_finite() && style.size > 0.0) {
                return Err(format!("font size {} is not positive", style.size));
            }
            let font = self
                .fonts
                .resolve(&style.font_name, style.size, style.bold, style.italic);
            let width = writer
                .measure(font.face, font.size, &span.text)
                .map_err(|e| e.to_string())?;
            let ascent = writer.ascent(font.face).map_err(|e| e.to_string())?;
            baseline_offset = baseline_offset.max(ascent * font.size / 1000.0);
            laid_out.push((span, font, width));
        }
        if laid_out.is_empty() {
            return Ok(());
        }

        let total: f64 = laid_out.iter().map(|(_, _, w)| w).sum();
        let mut x = match run.align {
            Align::Left => run.x,
            Align::Center => run.x + (run.w - total) / 2.0,
            Align::Right => run.x + run.w - total,
        };
        let baseline = run.y + baseline_offset;
        for (span, font, width) in laid_out {
            let placement = TextPlacement {
                x,
                baseline,
                text: &span.text,
                face: font.face,
                size: font.size,
                color,
            };
            writer
                .place_text(handle, &placement)
                .map_err(|e| e.to_string())?;
            x += width;
        }
        Ok(())
    }
}

fn lookup_color(palette: &ColorPalette, index: usize, el: ElementRef) -> Result<Rgb, ItemError> {
    palette
        .color_at(index)
        .ok_or_else(|| el.error(format!("color index {index} is not in the palette")))
}

fn check_rect(rect: &Placement, el: ElementRef) -> Result<(), ItemError> {
    let finite = [rect.x, rect.y, rect.w, rect.h].iter().all(|v| v.is_finite());
    if !finite || rect.w < 0.0 || rect.h < 0.0 {
        return Err(el.error(format!(
            "malformed rectangle {} {} {} {}",
            rect.x, rect.y, rect.w, rect.h
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfedit_core::{Fill, HLine, Image, PageRecord, RejectedElement, StyleTuple, VLine};
    use pdfedit_parse::BackendError;

    /// Records every call instead of producing a document.
    #[derive(Debug, Default)]
    struct RecordingWriter {
        pages: Vec<(f64, f64)>,
        calls: Vec<String>,
    }

    impl DocumentWriter for RecordingWriter {
        type Page = usize;
        type Error = BackendError;

        fn new_document() -> Self {
            Self::default()
        }

        fn new_page(&mut self, width: f64, height: f64) -> usize {
            self.pages.push((width, height));
            self.pages.len() - 1
        }

        fn place_text(&mut self, page: usize, text: &TextPlacement<'_>) -> Result<(), BackendError> {
            if text.text.contains('\u{4e2d}') {
                return Err(BackendError::Placement("glyph not encodable".to_string()));
            }
            self.calls.push(format!(
                "text p{page} {} @{:.2},{:.2} {} {}",
                text.text, text.x, text.baseline, text.face, text.color
            ));
            Ok(())
        }

        fn place_line(&mut self, page: usize, line: &LinePlacement<'_>) -> Result<(), BackendError> {
            self.calls.push(format!(
                "line p{page} {},{} -> {},{} dashed={}",
                line.from.x,
                line.from.y,
                line.to.x,
                line.to.y,
                line.dash.is_some()
            ));
            Ok(())
        }

        fn place_rect(&mut self, page: usize, rect: &Placement, fill: Rgb) -> Result<(), BackendError> {
            self.calls
                .push(format!("rect p{page} {} {} {} {} {fill}", rect.x, rect.y, rect.w, rect.h));
            Ok(())
        }

        fn place_image(
            &mut self,
            page: usize,
            rect: &Placement,
            ext: &str,
            _bytes: &[u8],
        ) -> Result<(), BackendError> {
            self.calls
                .push(format!("image p{page} {ext} {} {}", rect.x, rect.y));
            Ok(())
        }

        fn measure(&self, _face: &str, size: f64, text: &str) -> Result<f64, BackendError> {
            // Every glyph is half an em wide.
            Ok(text.chars().count() as f64 * size / 2.0)
        }

        fn ascent(&self, _face: &str) -> Result<f64, BackendError> {
            Ok(800.0)
        }

        fn serialize(self, _options: &ReconstructOptions) -> Result<Vec<u8>, BackendError> {
            Ok(self.calls.join("\n").into_bytes())
        }
    }

    fn reconstruct(record: DocumentRecord) -> (Vec<String>, Report) {
        let out = DocumentReconstructor::<RecordingWriter>::default()
            .reconstruct(record)
            .unwrap();
        let text = String::from_utf8(out.bytes).unwrap();
        (text.lines().map(str::to_string).collect(), out.report)
    }

    fn palette() -> ColorPalette {
        let mut palette = ColorPalette::new();
        palette.index_of(Rgb::BLACK);
        palette.index_of(Rgb(0xFF0000));
        palette
    }

    fn run(text: &str, font: &str, align: Align) -> TextRun {
        TextRun {
            x: 100.0,
            y: 50.0,
            w: 200.0,
            color_index: 1,
            align,
            runs: vec![StyledSpan::new(text, StyleTuple::new(font, 10.0, false, false))],
        }
    }

    fn page(texts: Vec<TextRun>) -> PageRecord {
        PageRecord {
            width: Some(612.0),
            height: Some(792.0),
            texts,
            ..PageRecord::default()
        }
    }

    #[test]
    fn paint_order_is_fills_lines_images_text() {
        let mut record = page(vec![run("Hi", "helv", Align::Left)]);
        record.images.push(Image {
            source_ref: "5 0 R".to_string(),
            ext: "png".to_string(),
            width: 1,
            height: 1,
            bytes: vec![0],
            bbox: Some(Placement {
                x: 1.0,
                y: 2.0,
                w: 3.0,
                h: 4.0,
            }),
        });
        record.vlines.push(VLine {
            x: 5.0,
            y: 0.0,
            length: 10.0,
            width: 1.0,
            color_index: 0,
            dashed: true,
        });
        record.hlines.push(HLine {
            x: 0.0,
            y: 5.0,
            length: 10.0,
            width: 1.0,
            color_index: 0,
            dashed: false,
        });
        record.fills.push(Fill {
            x: 0.0,
            y: 0.0,
            w: 10.0,
            h: 10.0,
            color_index: 1,
        });
        let (calls, report) = reconstruct(DocumentRecord {
            pages: vec![record],
            color_palette: palette(),
        });
        assert!(report.is_clean());
        let kinds: Vec<&str> = calls
            .iter()
            .map(|c| c.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(kinds, vec!["rect", "line", "line", "image", "text"]);
        assert_eq!(calls[0], "rect p0 0 0 10 10 #ff0000");
        assert_eq!(calls[1], "line p0 0,5 -> 10,5 dashed=false");
        assert_eq!(calls[2], "line p0 5,0 -> 5,10 dashed=true");
        // Baseline = y + 800 * 10 / 1000.
        assert_eq!(calls[4], "text p0 Hi @100.00,58.00 Helvetica #ff0000");
    }

    #[test]
    fn alignment_uses_measured_width() {
        let record = page(vec![
            run("abcd", "Times", Align::Center),
            run("abcd", "Courier-Bold", Align::Right),
        ]);
        let (calls, _) = reconstruct(DocumentRecord {
            pages: vec![record],
            color_palette: palette(),
        });
        // Four glyphs of 5pt = 20pt.
        assert_eq!(calls[0], "text p0 abcd @190.00,58.00 Times-Roman #ff0000");
        // FontResolver ignores the name's variant; the style flags decide.
        assert_eq!(calls[1], "text p0 abcd @280.00,58.00 Courier #ff0000");
    }

    #[test]
    fn multi_span_run_shares_baseline() {
        let mut text = run("Bold", "Arial", Align::Left);
        text.runs
            .push(StyledSpan::new(" tail", StyleTuple::new("Arial", 10.0, true, false)));
        text.runs.push(StyledSpan::new("", StyleTuple::new("Arial", 10.0, false, false)));
        let (calls, _) = reconstruct(DocumentRecord {
            pages: vec![page(vec![text])],
            color_palette: palette(),
        });
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], "text p0 Bold @100.00,58.00 Helvetica #ff0000");
        assert_eq!(calls[1], "text p0  tail @120.00,58.00 Helvetica-Bold #ff0000");
    }

    #[test]
    fn bad_elements_are_skipped_individually() {
        let mut unknown_color = run("lost", "helv", Align::Left);
        unknown_color.color_index = 7;
        let mut record = page(vec![
            unknown_color,
            run("\u{4e2d}", "helv", Align::Left),
            run("kept", "helv", Align::Left),
        ]);
        record.images.push(Image {
            source_ref: "5 0 R".to_string(),
            ext: "png".to_string(),
            width: 1,
            height: 1,
            bytes: vec![0],
            bbox: None,
        });
        record.fills.push(Fill {
            x: 0.0,
            y: 0.0,
            w: -1.0,
            h: 10.0,
            color_index: 0,
        });
        let (calls, report) = reconstruct(DocumentRecord {
            pages: vec![record],
            color_palette: palette(),
        });
        assert_eq!(calls, vec!["text p0 kept @100.00,58.00 Helvetica #ff0000"]);
        assert_eq!(report.len(), 4);
        let kinds: Vec<ElementKind> = report
            .skipped()
            .iter()
            .filter_map(|e| match e {
                ItemError::ElementPlacement { element, .. } => Some(*element),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                ElementKind::Fill,
                ElementKind::Image,
                ElementKind::Text,
                ElementKind::Text
            ]
        );
    }

    #[test]
    fn invalid_pages_are_skipped() {
        let missing_height = PageRecord {
            width: Some(100.0),
            ..PageRecord::default()
        };
        let out = DocumentReconstructor::<RecordingWriter>::default()
            .reconstruct(DocumentRecord {
                pages: vec![missing_height, page(vec![run("ok", "helv", Align::Left)])],
                color_palette: palette(),
            })
            .unwrap();
        assert_eq!(out.report.len(), 1);
        assert!(matches!(
            out.report.skipped()[0],
            ItemError::Validation { page: 0, .. }
        ));
        assert_eq!(String::from_utf8(out.bytes).unwrap(), "text p0 ok @100.00,58.00 Helvetica #ff0000");
    }

    #[test]
    fn unreadable_elements_are_reported_on_drawn_pages() {
        let rejected = |index| RejectedElement {
            element: ElementKind::Fill,
            index,
            reason: "missing field `h`".to_string(),
        };
        let mut drawn = page(vec![run("ok", "helv", Align::Left)]);
        drawn.rejected.push(rejected(1));
        let skipped_page = PageRecord {
            width: Some(100.0),
            rejected: vec![rejected(0)],
            ..PageRecord::default()
        };
        let out = DocumentReconstructor::<RecordingWriter>::default()
            .reconstruct(DocumentRecord {
                pages: vec![skipped_page, drawn],
                color_palette: palette(),
            })
            .unwrap();

        assert_eq!(out.report.len(), 2);
        assert!(matches!(out.report.skipped()[0], ItemError::Validation { page: 0, .. }));
        assert_eq!(
            out.report.skipped()[1].to_string(),
            "page 1: fill #1 skipped: unreadable: missing field `h`"
        );
        assert_eq!(String::from_utf8(out.bytes).unwrap(), "text p0 ok @100.00,58.00 Helvetica #ff0000");
    }

    #[test]
    fn empty_record_still_serializes() {
        let out = DocumentReconstructor::<LopdfWriter>::default()
            .reconstruct(DocumentRecord::default())
            .unwrap();
        assert!(out.bytes.starts_with(b"%PDF"));
        assert!(out.report.is_clean());
    }
}
