//! Span assembly.
//!
//! The interpreter reports one span per text-showing operator. Producers
//! often split a visual run of text across many operators (kerning, word
//! positioning); consecutive pieces that share a style and sit next to each
//! other on one baseline are joined back together here.

use pdfedit_core::RawSpan;

/// Baseline tolerance for joining spans, in points.
const BASELINE_TOLERANCE: f64 = 0.5;

/// Largest gap, as a fraction of the font size, bridged by a join.
const MAX_GAP: f64 = 0.3;

/// Gaps wider than this fraction of the font size become a space.
const SPACE_GAP: f64 = 0.15;

/// Overlap, as a fraction of the font size, still treated as adjacent.
const MAX_OVERLAP: f64 = 0.25;

/// Merge consecutive spans that continue one another.
pub fn merge_spans(spans: Vec<RawSpan>) -> Vec<RawSpan> {
    let mut out: Vec<RawSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match out.last_mut() {
            Some(prev) if continues(prev, &span) => {
                let gap = span.bbox.x0 - prev.bbox.x1;
                if gap > SPACE_GAP * span.size
                    && !prev.text.ends_with(char::is_whitespace)
                    && !span.text.starts_with(char::is_whitespace)
                {
                    prev.text.push(' ');
                }
                prev.text.push_str(&span.text);
                prev.bbox = prev.bbox.union(&span.bbox);
            }
            _ => out.push(span),
        }
    }
    out
}

fn continues(prev: &RawSpan, next: &RawSpan) -> bool {
    if prev.font != next.font
        || prev.size != next.size
        || prev.color != next.color
        || prev.flags != next.flags
    {
        return false;
    }
    if (prev.bbox.bottom - next.bbox.bottom).abs() > BASELINE_TOLERANCE {
        return false;
    }
    let gap = next.bbox.x0 - prev.bbox.x1;
    gap <= MAX_GAP * next.size && gap >= -MAX_OVERLAP * next.size
}
