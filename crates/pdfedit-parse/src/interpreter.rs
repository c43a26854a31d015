//! Content stream interpreter.
//!
//! Decodes a content stream with lopdf, tracks graphics and text state,
//! and reports spans, drawing primitives and images to a
//! [`ContentHandler`]. Only the classes the handler collects are decoded;
//! a malformed operator of a collected class aborts with an error, while a
//! malformed operator of any other class is skipped.

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object};
use pdfedit_core::{BBox, Ctm, ExtractOptions, Point, RawSpan, flip_y};

use crate::error::BackendError;
use crate::font::{LoadedFont, load_font};
use crate::graphics_state::{ColorSpace, InterpreterState};
use crate::handler::{ContentClass, ContentHandler};
use crate::images::{decode_image, placement};
use crate::objects::{get, get_dict, resolve, to_f64};
use crate::paths::{Paint, PathBuilder, to_drawings};
use crate::text_state::TextState;

/// A `TJ` adjustment at least this large (in thousandths of an em,
/// negative) is read as a word break.
const SPACE_ADJUSTMENT: f64 = 200.0;

/// Per-page inputs shared by every nested content stream.
pub(crate) struct PageContext<'a> {
    pub doc: &'a Document,
    pub page_height: f64,
    pub options: &'a ExtractOptions,
}

/// One element of a text-showing operator.
enum TextPiece<'o> {
    Bytes(&'o [u8]),
    Adjust(f64),
}

/// Interpret one content stream.
///
/// `depth` is 0 for page content and grows by one per form XObject.
pub(crate) fn interpret(
    ctx: &PageContext<'_>,
    content: &[u8],
    resources: &Dictionary,
    handler: &mut dyn ContentHandler,
    depth: usize,
    gstate: &mut InterpreterState,
    tstate: &mut TextState,
) -> Result<(), BackendError> {
    if depth > ctx.options.max_recursion_depth {
        return Err(BackendError::Interpreter(format!(
            "form XObject nesting depth {depth} exceeds limit {}",
            ctx.options.max_recursion_depth
        )));
    }

    let content = Content::decode(content)
        .map_err(|e| BackendError::Parse(format!("content stream syntax: {e}")))?;
    let text = handler.collects(ContentClass::Text);
    let paths = handler.collects(ContentClass::Paths);

    let mut fonts: HashMap<String, LoadedFont> = HashMap::new();
    let mut path = PathBuilder::new(*gstate.ctm());

    for op in &content.operations {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            // Graphics state
            "q" => gstate.save(tstate.save_snapshot()),
            "Q" => {
                if let Some(snapshot) = gstate.restore() {
                    tstate.restore_snapshot(snapshot);
                }
                path.set_ctm(*gstate.ctm());
            }
            "cm" => {
                if let Some([a, b, c, d, e, f]) = numbers::<6>(operands) {
                    gstate.concat_matrix(Ctm::new(a, b, c, d, e, f));
                    path.set_ctm(*gstate.ctm());
                }
            }
            "w" => {
                if let Some(width) = number(operands, 0) {
                    gstate.set_line_width(width);
                }
            }
            "d" => {
                if let Some(Object::Array(items)) = operands.first() {
                    gstate.set_dash_array(items.iter().filter_map(to_f64).collect());
                }
            }

            // Color
            "G" | "g" | "RG" | "rg" | "K" | "k" => set_device_color(gstate, op),
            "CS" => {
                if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                    gstate.set_stroke_space(color_space(ctx.doc, resources, name));
                }
            }
            "cs" => {
                if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                    gstate.set_fill_space(color_space(ctx.doc, resources, name));
                }
            }
            "SC" | "SCN" => {
                let components: Vec<f64> = operands.iter().filter_map(to_f64).collect();
                gstate.set_stroke_components(&components);
            }
            "sc" | "scn" => {
                let components: Vec<f64> = operands.iter().filter_map(to_f64).collect();
                gstate.set_fill_components(&components);
            }

            // Text state
            "BT" => tstate.begin_text(),
            "Tf" => match (operands.first().and_then(|o| o.as_name().ok()), number(operands, 1)) {
                (Some(name), Some(size)) => {
                    tstate.set_font(String::from_utf8_lossy(name).into_owned(), size);
                }
                _ => malformed(text, op)?,
            },
            "Tm" => match numbers::<6>(operands) {
                Some([a, b, c, d, e, f]) => tstate.set_text_matrix(Ctm::new(a, b, c, d, e, f)),
                None => malformed(text, op)?,
            },
            "Td" => match numbers::<2>(operands) {
                Some([tx, ty]) => tstate.move_text_position(tx, ty),
                None => malformed(text, op)?,
            },
            "TD" => match numbers::<2>(operands) {
                Some([tx, ty]) => tstate.move_text_position_and_set_leading(tx, ty),
                None => malformed(text, op)?,
            },
            "T*" => tstate.move_to_next_line(),
            "Tc" | "Tw" | "Tz" | "TL" | "Ts" => match number(operands, 0) {
                Some(v) => set_text_parameter(tstate, &op.operator, v),
                None => malformed(text, op)?,
            },

            // Text showing
            "Tj" | "'" | "\"" | "TJ" if text => {
                let Some(pieces) = text_pieces(op) else {
                    return Err(malformed_error(op));
                };
                if op.operator == "\"" {
                    if let Some([aw, ac]) = numbers::<2>(operands) {
                        tstate.word_spacing = aw;
                        tstate.char_spacing = ac;
                    }
                }
                if op.operator == "'" || op.operator == "\"" {
                    tstate.move_to_next_line();
                }
                show_text(ctx, resources, &mut fonts, handler, gstate, tstate, &pieces)?;
            }

            // Path construction
            "m" | "l" | "c" | "v" | "y" | "re" if paths => {
                build_path(&mut path, op)?;
            }
            "h" if paths => path.close_path(),

            // Path painting
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" | "n" if paths => {
                if matches!(op.operator.as_str(), "s" | "b" | "b*") {
                    path.close_path();
                }
                let segments = path.take();
                let state = gstate.current();
                let stroke = matches!(op.operator.as_str(), "S" | "s" | "B" | "B*" | "b" | "b*");
                let fill = matches!(op.operator.as_str(), "f" | "F" | "f*" | "B" | "B*" | "b" | "b*");
                let paint = Paint {
                    stroke: stroke.then_some(state.stroke_color),
                    fill: fill.then_some(state.fill_color),
                    width: state.device_line_width(),
                    dashed: state.is_dashed(),
                };
                for drawing in to_drawings(&segments, &paint, ctx.page_height) {
                    handler.on_drawing(drawing);
                }
            }

            // XObjects
            "Do" => match operands.first().and_then(|o| o.as_name().ok()) {
                Some(name) => handle_do(ctx, resources, handler, depth, gstate, tstate, name)?,
                None => malformed(handler.collects(ContentClass::Images), op)?,
            },

            // Clipping, marked content, compatibility and anything unknown.
            _ => {}
        }
    }
    Ok(())
}

fn malformed_error(op: &Operation) -> BackendError {
    BackendError::Interpreter(format!(
        "malformed `{}` operator with {} operand(s)",
        op.operator,
        op.operands.len()
    ))
}

/// Fail when the operator belongs to a collected class, otherwise skip it.
fn malformed(collected: bool, op: &Operation) -> Result<(), BackendError> {
    if collected {
        Err(malformed_error(op))
    } else {
        Ok(())
    }
}

fn number(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(to_f64)
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = number(operands, i)?;
    }
    Some(out)
}

fn set_device_color(gstate: &mut InterpreterState, op: &Operation) {
    let components: Vec<f64> = op.operands.iter().filter_map(to_f64).collect();
    let space = match op.operator.as_str() {
        "G" | "g" => ColorSpace::DeviceGray,
        "RG" | "rg" => ColorSpace::DeviceRgb,
        _ => ColorSpace::DeviceCmyk,
    };
    let Some(color) = space.resolve(&components) else {
        return;
    };
    if op.operator.chars().all(|c| c.is_ascii_uppercase()) {
        gstate.set_stroke(space, color);
    } else {
        gstate.set_fill(space, color);
    }
}

/// Resolve a `CS`/`cs` operand, looking through `/Resources/ColorSpace`.
fn color_space(doc: &Document, resources: &Dictionary, name: &[u8]) -> ColorSpace {
    let direct = ColorSpace::from_name(name);
    if direct != ColorSpace::Inferred {
        return direct;
    }
    let Some(entry) = get_dict(doc, resources, b"ColorSpace").and_then(|d| get(doc, d, name)) else {
        return ColorSpace::Inferred;
    };
    match entry {
        Object::Name(n) => ColorSpace::from_name(n),
        Object::Array(items) => {
            let family = items.first().and_then(|o| o.as_name().ok()).unwrap_or(b"");
            if family == b"ICCBased" {
                let components = items
                    .get(1)
                    .and_then(|o| resolve(doc, o).as_stream().ok())
                    .and_then(|s| s.dict.get(b"N").ok())
                    .and_then(|o| o.as_i64().ok());
                match components {
                    Some(1) => ColorSpace::DeviceGray,
                    Some(3) => ColorSpace::DeviceRgb,
                    Some(4) => ColorSpace::DeviceCmyk,
                    _ => ColorSpace::Inferred,
                }
            } else {
                ColorSpace::from_name(family)
            }
        }
        _ => ColorSpace::Inferred,
    }
}

fn set_text_parameter(tstate: &mut TextState, operator: &str, value: f64) {
    match operator {
        "Tc" => tstate.char_spacing = value,
        "Tw" => tstate.word_spacing = value,
        "Tz" => tstate.h_scaling = value,
        "TL" => tstate.leading = value,
        _ => tstate.rise = value,
    }
}

fn text_pieces(op: &Operation) -> Option<Vec<TextPiece<'_>>> {
    match op.operator.as_str() {
        "TJ" => {
            let Some(Object::Array(items)) = op.operands.first() else {
                return None;
            };
            items
                .iter()
                .map(|item| match item {
                    Object::String(bytes, _) => Some(TextPiece::Bytes(bytes)),
                    other => to_f64(other).map(TextPiece::Adjust),
                })
                .collect()
        }
        "\"" => match op.operands.get(2) {
            Some(Object::String(bytes, _)) => Some(vec![TextPiece::Bytes(bytes)]),
            _ => None,
        },
        _ => match op.operands.first() {
            Some(Object::String(bytes, _)) => Some(vec![TextPiece::Bytes(bytes)]),
            _ => None,
        },
    }
}

fn font_for<'c>(
    doc: &Document,
    resources: &Dictionary,
    cache: &'c mut HashMap<String, LoadedFont>,
    key: &str,
) -> Result<&'c LoadedFont, BackendError> {
    if !cache.contains_key(key) {
        let dict = get_dict(doc, resources, b"Font").and_then(|fonts| {
            get(doc, fonts, key.as_bytes()).and_then(|o| o.as_dict().ok())
        });
        let font = match dict {
            Some(dict) => load_font(doc, dict)?,
            None => LoadedFont::fallback(key),
        };
        cache.insert(key.to_string(), font);
    }
    cache
        .get(key)
        .ok_or_else(|| BackendError::Font(format!("font /{key} is unavailable")))
}

/// Show text and report it as one span.
#[allow(clippy::too_many_arguments)]
fn show_text(
    ctx: &PageContext<'_>,
    resources: &Dictionary,
    fonts: &mut HashMap<String, LoadedFont>,
    handler: &mut dyn ContentHandler,
    gstate: &InterpreterState,
    tstate: &mut TextState,
    pieces: &[TextPiece<'_>],
) -> Result<(), BackendError> {
    let key = tstate
        .font_name
        .clone()
        .ok_or_else(|| BackendError::Interpreter("text shown before any Tf".to_string()))?;
    let font = font_for(ctx.doc, resources, fonts, &key)?;
    let ctm = *gstate.ctm();
    let size = tstate.font_size;
    let h_scale = tstate.h_scaling_normalized();
    let start = tstate.text_matrix().concat(&ctm);

    let mut text = String::new();
    for piece in pieces {
        match piece {
            TextPiece::Bytes(bytes) => {
                for glyph in font.decode(bytes) {
                    text.push_str(&glyph.text);
                    let mut tx = glyph.width / 1000.0 * size + tstate.char_spacing;
                    if glyph.code == 32 && !font.is_two_byte() {
                        tx += tstate.word_spacing;
                    }
                    tstate.advance(tx * h_scale);
                }
            }
            TextPiece::Adjust(adjust) => {
                if *adjust <= -SPACE_ADJUSTMENT && !text.is_empty() && !text.ends_with(' ') {
                    text.push(' ');
                }
                tstate.advance(-adjust / 1000.0 * size * h_scale);
            }
        }
    }
    if text.is_empty() {
        return Ok(());
    }

    let end = tstate.text_matrix().concat(&ctm);
    let origin = start.transform_point(Point::new(0.0, tstate.rise));
    let finish = end.transform_point(Point::new(0.0, tstate.rise));
    let rendered = size.abs() * start.vertical_scale();
    let span_size = round3(rendered);
    // Text at zero size is invisible and cannot be drawn again.
    if !span_size.is_finite() || span_size <= 0.0 {
        return Ok(());
    }
    let top = flip_y(origin.y + font.ascent * rendered / 1000.0, ctx.page_height);
    let bottom = flip_y(origin.y + font.descent * rendered / 1000.0, ctx.page_height);

    handler.on_span(RawSpan {
        bbox: BBox::new(origin.x.min(finish.x), top, origin.x.max(finish.x), bottom),
        font: if font.name.is_empty() { key } else { font.name.clone() },
        size: span_size,
        flags: font.style_flags,
        color: gstate.current().fill_color.to_rgb(),
        text,
    });
    Ok(())
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn build_path(path: &mut PathBuilder, op: &Operation) -> Result<(), BackendError> {
    let operands = op.operands.as_slice();
    let ok = match op.operator.as_str() {
        "m" => numbers::<2>(operands).map(|[x, y]| path.move_to(x, y)),
        "l" => numbers::<2>(operands).map(|[x, y]| path.line_to(x, y)),
        "c" => numbers::<6>(operands).map(|[_, _, _, _, x, y]| path.curve_to(x, y)),
        "v" | "y" => numbers::<4>(operands).map(|[_, _, x, y]| path.curve_to(x, y)),
        _ => numbers::<4>(operands).map(|[x, y, w, h]| path.rectangle(x, y, w, h)),
    };
    ok.ok_or_else(|| malformed_error(op))
}

#[allow(clippy::too_many_arguments)]
fn handle_do(
    ctx: &PageContext<'_>,
    resources: &Dictionary,
    handler: &mut dyn ContentHandler,
    depth: usize,
    gstate: &mut InterpreterState,
    tstate: &mut TextState,
    name: &[u8],
) -> Result<(), BackendError> {
    let images = handler.collects(ContentClass::Images);
    let entry = get_dict(ctx.doc, resources, b"XObject").and_then(|x| x.get(name).ok());
    let Some(Object::Reference(id)) = entry else {
        return if images {
            Err(BackendError::Interpreter(format!(
                "XObject /{} is missing or not a reference",
                String::from_utf8_lossy(name)
            )))
        } else {
            Ok(())
        };
    };
    let Ok(stream) = ctx.doc.get_object(*id).and_then(Object::as_stream) else {
        return if images {
            Err(BackendError::Interpreter(format!("XObject {} {} R is not a stream", id.0, id.1)))
        } else {
            Ok(())
        };
    };

    match stream.dict.get(b"Subtype").and_then(Object::as_name) {
        Ok(b"Image") if images => {
            let bbox = placement(gstate.ctm(), ctx.page_height);
            handler.on_image(decode_image(ctx.doc, *id, stream, bbox)?);
            Ok(())
        }
        Ok(b"Form") => {
            let base = gstate.stack_depth();
            gstate.save(tstate.save_snapshot());
            if let Some(m) = get(ctx.doc, &stream.dict, b"Matrix").and_then(|o| o.as_array().ok()) {
                let values: Vec<f64> = m.iter().filter_map(to_f64).collect();
                if let [a, b, c, d, e, f] = values[..] {
                    gstate.concat_matrix(Ctm::new(a, b, c, d, e, f));
                }
            }
            let form_resources = get_dict(ctx.doc, &stream.dict, b"Resources").unwrap_or(resources);
            let content = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            let result = interpret(ctx, &content, form_resources, handler, depth + 1, gstate, tstate);
            // Unbalanced q inside the form must not leak out of it.
            while gstate.stack_depth() > base + 1 {
                gstate.restore();
            }
            if let Some(snapshot) = gstate.restore() {
                tstate.restore_snapshot(snapshot);
            }
            result
        }
        _ => Ok(()),
    }
}
