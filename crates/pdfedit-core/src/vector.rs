//! Classification of raw path primitives into model lines and fills.
//!
//! Segments become horizontal or vertical lines when one axis moves less
//! than [`LINE_TOLERANCE`] and the other at least that much. Diagonal and
//! zero-length segments are dropped. Rectangles only become fills, and
//! only when they were painted with a fill color; the model has no
//! stroked-rectangle primitive.

use crate::model::{Fill, HLine, VLine};
use crate::palette::ColorPalette;
use crate::raw::{DrawingShape, RawDrawing};

/// Axis tolerance, in points, for line classification.
pub const LINE_TOLERANCE: f64 = 1.0;

/// A classified drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Vector {
    Horizontal(HLine),
    Vertical(VLine),
    Fill(Fill),
}

/// Classify one primitive, registering its color in `palette` when kept.
///
/// Returns `None` when the primitive has no representation in the model.
/// The palette is only touched for primitives that are kept.
pub fn classify(drawing: &RawDrawing, palette: &mut ColorPalette) -> Option<Vector> {
    match drawing.shape {
        DrawingShape::Segment { from, to } => {
            // Fill-only paths contribute no visible segments.
            let stroke = drawing.stroke?;
            let dx = (to.x - from.x).abs();
            let dy = (to.y - from.y).abs();
            if dy < LINE_TOLERANCE && dx >= LINE_TOLERANCE {
                Some(Vector::Horizontal(HLine {
                    x: from.x.min(to.x),
                    y: from.y,
                    length: dx,
                    width: drawing.width,
                    color_index: palette.index_of(stroke),
                    dashed: drawing.dashed,
                }))
            } else if dx < LINE_TOLERANCE && dy >= LINE_TOLERANCE {
                Some(Vector::Vertical(VLine {
                    x: from.x,
                    y: from.y.min(to.y),
                    length: dy,
                    width: drawing.width,
                    color_index: palette.index_of(stroke),
                    dashed: drawing.dashed,
                }))
            } else {
                None
            }
        }
        DrawingShape::Rect(bbox) => {
            let fill = drawing.fill?;
            Some(Vector::Fill(Fill {
                x: bbox.x0,
                y: bbox.top,
                w: bbox.width(),
                h: bbox.height(),
                color_index: palette.index_of(fill),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::geometry::{BBox, Point};

    fn stroked(x0: f64, y0: f64, x1: f64, y1: f64) -> RawDrawing {
        RawDrawing::segment(Point::new(x0, y0), Point::new(x1, y1)).with_stroke(Rgb::BLACK, 0.5)
    }

    #[test]
    fn horizontal_segment() {
        let mut palette = ColorPalette::new();
        let v = classify(&stroked(0.0, 10.0, 50.0, 10.0), &mut palette);
        assert_eq!(
            v,
            Some(Vector::Horizontal(HLine {
                x: 0.0,
                y: 10.0,
                length: 50.0,
                width: 0.5,
                color_index: 0,
                dashed: false,
            }))
        );
    }

    #[test]
    fn horizontal_segment_drawn_right_to_left() {
        let mut palette = ColorPalette::new();
        let Some(Vector::Horizontal(line)) = classify(&stroked(50.0, 10.0, 0.0, 10.4), &mut palette)
        else {
            panic!("expected a horizontal line");
        };
        assert_eq!(line.x, 0.0);
        assert_eq!(line.y, 10.0);
        assert_eq!(line.length, 50.0);
    }

    #[test]
    fn vertical_segment() {
        let mut palette = ColorPalette::new();
        let v = classify(&stroked(10.0, 0.0, 10.0, 50.0), &mut palette);
        assert_eq!(
            v,
            Some(Vector::Vertical(VLine {
                x: 10.0,
                y: 0.0,
                length: 50.0,
                width: 0.5,
                color_index: 0,
                dashed: false,
            }))
        );
    }

    #[test]
    fn diagonal_segment_is_dropped() {
        let mut palette = ColorPalette::new();
        assert_eq!(classify(&stroked(0.0, 0.0, 50.0, 50.0), &mut palette), None);
        assert!(palette.is_empty());
    }

    #[test]
    fn degenerate_segment_is_dropped() {
        let mut palette = ColorPalette::new();
        assert_eq!(classify(&stroked(5.0, 5.0, 5.5, 5.5), &mut palette), None);
    }

    #[test]
    fn threshold_is_inclusive_for_length() {
        let mut palette = ColorPalette::new();
        assert!(matches!(
            classify(&stroked(0.0, 0.0, 1.0, 0.0), &mut palette),
            Some(Vector::Horizontal(_))
        ));
        assert!(matches!(
            classify(&stroked(0.0, 0.0, 0.0, 1.0), &mut palette),
            Some(Vector::Vertical(_))
        ));
    }

    #[test]
    fn unstroked_segment_is_dropped() {
        let mut palette = ColorPalette::new();
        let drawing = RawDrawing::segment(Point::new(0.0, 0.0), Point::new(50.0, 0.0));
        assert_eq!(classify(&drawing, &mut palette), None);
    }

    #[test]
    fn dashed_flag_is_carried() {
        let mut palette = ColorPalette::new();
        let drawing = stroked(0.0, 0.0, 0.0, 20.0).dashed(true);
        let Some(Vector::Vertical(line)) = classify(&drawing, &mut palette) else {
            panic!("expected a vertical line");
        };
        assert!(line.dashed);
    }

    #[test]
    fn filled_rect_becomes_fill() {
        let mut palette = ColorPalette::new();
        palette.index_of(Rgb::BLACK);
        let drawing = RawDrawing::rect(BBox::new(10.0, 20.0, 110.0, 70.0)).with_fill(Rgb(0xff0000));
        assert_eq!(
            classify(&drawing, &mut palette),
            Some(Vector::Fill(Fill {
                x: 10.0,
                y: 20.0,
                w: 100.0,
                h: 50.0,
                color_index: 1,
            }))
        );
    }

    #[test]
    fn stroke_only_rect_is_dropped() {
        let mut palette = ColorPalette::new();
        let drawing =
            RawDrawing::rect(BBox::new(10.0, 20.0, 110.0, 70.0)).with_stroke(Rgb(0x00ff00), 1.0);
        assert_eq!(classify(&drawing, &mut palette), None);
        assert!(palette.is_empty());
    }
}
