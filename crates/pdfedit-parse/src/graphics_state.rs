//! Graphics state stack for the content stream interpreter.
//!
//! A stack of states managed by `q` (save) and `Q` (restore), with CTM
//! updates via `cm`, line width and dash via `w`/`d`, and color setting via
//! the G/g, RG/rg, K/k, CS/cs and SC/SCN/sc/scn operators.

use pdfedit_core::{Color, Ctm};

use crate::text_state::TextStateSnapshot;

/// The color spaces the interpreter distinguishes.
///
/// Anything else (ICC-based, indexed, patterns) is resolved by component
/// count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpace {
    #[default]
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
    Inferred,
}

impl ColorSpace {
    pub fn from_name(name: &[u8]) -> Self {
        match name {
            b"DeviceGray" | b"CalGray" | b"G" => ColorSpace::DeviceGray,
            b"DeviceRGB" | b"CalRGB" | b"RGB" => ColorSpace::DeviceRgb,
            b"DeviceCMYK" | b"CMYK" => ColorSpace::DeviceCmyk,
            _ => ColorSpace::Inferred,
        }
    }

    /// Build a color from operands of `SC`/`sc`-family operators.
    pub fn resolve(self, components: &[f64]) -> Option<Color> {
        match (self, components) {
            (ColorSpace::DeviceGray, [g, ..]) => Some(Color::gray(*g)),
            (ColorSpace::DeviceRgb, [r, g, b, ..]) => Some(Color::new(*r, *g, *b)),
            (ColorSpace::DeviceCmyk, [c, m, y, k, ..]) => Some(Color::from_cmyk(*c, *m, *y, *k)),
            _ => Color::from_components(components),
        }
    }
}

/// Painting parameters in effect at a given point of a content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    pub ctm: Ctm,
    pub line_width: f64,
    pub dash_array: Vec<f64>,
    pub stroke_color: Color,
    pub fill_color: Color,
    pub stroke_space: ColorSpace,
    pub fill_space: ColorSpace,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Ctm::identity(),
            line_width: 1.0,
            dash_array: Vec::new(),
            stroke_color: Color::black(),
            fill_color: Color::black(),
            stroke_space: ColorSpace::DeviceGray,
            fill_space: ColorSpace::DeviceGray,
        }
    }
}

impl GraphicsState {
    /// Whether a non-empty dash array with a non-zero dash is in effect.
    pub fn is_dashed(&self) -> bool {
        self.dash_array.iter().any(|&d| d > 0.0)
    }

    /// Line width transformed to page space.
    pub fn device_line_width(&self) -> f64 {
        let scale = (self.ctm.horizontal_scale() + self.ctm.vertical_scale()) / 2.0;
        self.line_width * scale
    }
}

/// Interpreter-level state: the current graphics state plus the `q` stack.
#[derive(Debug, Clone, Default)]
pub struct InterpreterState {
    current: GraphicsState,
    stack: Vec<(GraphicsState, TextStateSnapshot)>,
}

impl InterpreterState {
    pub fn new(ctm: Ctm) -> Self {
        Self {
            current: GraphicsState {
                ctm,
                ..GraphicsState::default()
            },
            stack: Vec::new(),
        }
    }

    pub fn current(&self) -> &GraphicsState {
        &self.current
    }

    pub fn ctm(&self) -> &Ctm {
        &self.current.ctm
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// `q`: push the graphics state together with the text state parameters.
    pub fn save(&mut self, text: TextStateSnapshot) {
        self.stack.push((self.current.clone(), text));
    }

    /// `Q`: pop the most recent state. Returns `None` on an unbalanced `Q`.
    pub fn restore(&mut self) -> Option<TextStateSnapshot> {
        let (state, text) = self.stack.pop()?;
        self.current = state;
        Some(text)
    }

    /// `cm`: `CTM' = M × CTM`.
    pub fn concat_matrix(&mut self, m: Ctm) {
        self.current.ctm = m.concat(&self.current.ctm);
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.current.line_width = width;
    }

    pub fn set_dash_array(&mut self, dash_array: Vec<f64>) {
        self.current.dash_array = dash_array;
    }

    /// `G`, `RG`, `K`: set a device color and its color space.
    pub fn set_stroke(&mut self, space: ColorSpace, color: Color) {
        self.current.stroke_space = space;
        self.current.stroke_color = color;
    }

    /// `g`, `rg`, `k`.
    pub fn set_fill(&mut self, space: ColorSpace, color: Color) {
        self.current.fill_space = space;
        self.current.fill_color = color;
    }

    /// `CS`: selecting a color space resets the color to black.
    pub fn set_stroke_space(&mut self, space: ColorSpace) {
        self.set_stroke(space, Color::black());
    }

    /// `cs`.
    pub fn set_fill_space(&mut self, space: ColorSpace) {
        self.set_fill(space, Color::black());
    }

    /// `SC`/`SCN`. Operands that do not form a color leave it unchanged.
    pub fn set_stroke_components(&mut self, components: &[f64]) {
        if let Some(color) = self.current.stroke_space.resolve(components) {
            self.current.stroke_color = color;
        }
    }

    /// `sc`/`scn`.
    pub fn set_fill_components(&mut self, components: &[f64]) {
        if let Some(color) = self.current.fill_space.resolve(components) {
            self.current.fill_color = color;
        }
    }
}
