//! Path construction and conversion of painted paths to drawing primitives.

use pdfedit_core::{BBox, Color, Ctm, Point, RawDrawing, flip_y};

/// Tolerance for treating an edge as axis-aligned.
const AXIS_TOLERANCE: f64 = 1e-6;

/// A segment of a path, in PDF user space after the CTM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    /// Cubic Bézier; only the end point is kept.
    CurveTo(Point),
    ClosePath,
}

/// Builds a path from the `m l c v y re h` operators.
///
/// Coordinates are transformed through the CTM before storage.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    segments: Vec<PathSegment>,
    current_point: Option<Point>,
    subpath_start: Option<Point>,
    ctm: Ctm,
}

impl PathBuilder {
    pub fn new(ctm: Ctm) -> Self {
        Self {
            segments: Vec::new(),
            current_point: None,
            subpath_start: None,
            ctm,
        }
    }

    pub fn set_ctm(&mut self, ctm: Ctm) {
        self.ctm = ctm;
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        let p = self.ctm.transform_point(Point::new(x, y));
        self.segments.push(PathSegment::MoveTo(p));
        self.current_point = Some(p);
        self.subpath_start = Some(p);
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        let p = self.ctm.transform_point(Point::new(x, y));
        self.segments.push(PathSegment::LineTo(p));
        self.current_point = Some(p);
    }

    /// `c`, `v` and `y` all end at `(x3, y3)`.
    pub fn curve_to(&mut self, x3: f64, y3: f64) {
        let p = self.ctm.transform_point(Point::new(x3, y3));
        self.segments.push(PathSegment::CurveTo(p));
        self.current_point = Some(p);
    }

    pub fn close_path(&mut self) {
        self.segments.push(PathSegment::ClosePath);
        if let Some(start) = self.subpath_start {
            self.current_point = Some(start);
        }
    }

    /// `re`: moveto, three linetos, closepath.
    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close_path();
    }

    /// Take the accumulated segments and reset the builder.
    pub fn take(&mut self) -> Vec<PathSegment> {
        self.current_point = None;
        self.subpath_start = None;
        std::mem::take(&mut self.segments)
    }
}

/// How a path was painted.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub stroke: Option<Color>,
    pub fill: Option<Color>,
    /// Stroke width in page space.
    pub width: f64,
    pub dashed: bool,
}

/// Convert a painted path into drawing primitives in top-left page space.
///
/// Each subpath that is a closed, axis-aligned quadrilateral becomes one
/// rectangle. Other subpaths contribute their straight edges, including
/// the implicit closing edge, as segments when the path is stroked.
/// Curves never produce primitives.
pub fn to_drawings(segments: &[PathSegment], paint: &Paint, page_height: f64) -> Vec<RawDrawing> {
    let mut out = Vec::new();
    if paint.stroke.is_none() && paint.fill.is_none() {
        return out;
    }
    for subpath in split_subpaths(segments) {
        if let Some(bbox) = detect_rect(subpath, page_height) {
            let mut drawing = RawDrawing::rect(bbox).dashed(paint.dashed);
            if let Some(color) = paint.stroke {
                drawing = drawing.with_stroke(color.to_rgb(), paint.width);
            }
            if let Some(color) = paint.fill {
                drawing = drawing.with_fill(color.to_rgb());
            }
            out.push(drawing);
            continue;
        }
        let Some(color) = paint.stroke else {
            continue;
        };
        for (from, to) in straight_edges(subpath) {
            let from = Point::new(from.x, flip_y(from.y, page_height));
            let to = Point::new(to.x, flip_y(to.y, page_height));
            out.push(
                RawDrawing::segment(from, to)
                    .with_stroke(color.to_rgb(), paint.width)
                    .dashed(paint.dashed),
            );
        }
    }
    out
}

fn split_subpaths(segments: &[PathSegment]) -> Vec<&[PathSegment]> {
    let mut subpaths = Vec::new();
    let mut start = 0;
    for (i, seg) in segments.iter().enumerate() {
        if i > start && matches!(seg, PathSegment::MoveTo(_)) {
            subpaths.push(&segments[start..i]);
            start = i;
        }
    }
    if start < segments.len() {
        subpaths.push(&segments[start..]);
    }
    subpaths
}

fn straight_edges(subpath: &[PathSegment]) -> Vec<(Point, Point)> {
    let mut edges = Vec::new();
    let mut current: Option<Point> = None;
    let mut start: Option<Point> = None;
    for seg in subpath {
        match *seg {
            PathSegment::MoveTo(p) => {
                current = Some(p);
                start = Some(p);
            }
            PathSegment::LineTo(p) => {
                if let Some(from) = current {
                    edges.push((from, p));
                }
                current = Some(p);
            }
            PathSegment::CurveTo(p) => current = Some(p),
            PathSegment::ClosePath => {
                if let (Some(from), Some(to)) = (current, start) {
                    if from != to {
                        edges.push((from, to));
                    }
                }
                current = start;
            }
        }
    }
    edges
}

fn detect_rect(subpath: &[PathSegment], page_height: f64) -> Option<BBox> {
    let mut vertices = Vec::with_capacity(5);
    let mut closed = false;
    for seg in subpath {
        match *seg {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => vertices.push(p),
            PathSegment::CurveTo(_) => return None,
            PathSegment::ClosePath => closed = true,
        }
    }
    if vertices.len() == 5 && near(vertices[0], vertices[4]) {
        vertices.pop();
        closed = true;
    }
    if !closed || vertices.len() != 4 {
        return None;
    }
    for i in 0..4 {
        let a = vertices[i];
        let b = vertices[(i + 1) % 4];
        if (b.x - a.x).abs() > AXIS_TOLERANCE && (b.y - a.y).abs() > AXIS_TOLERANCE {
            return None;
        }
    }
    let flipped: Vec<Point> = vertices
        .iter()
        .map(|p| Point::new(p.x, flip_y(p.y, page_height)))
        .collect();
    BBox::from_points(&flipped)
}

fn near(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < AXIS_TOLERANCE && (a.y - b.y).abs() < AXIS_TOLERANCE
}
