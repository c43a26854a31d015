//! Deduplicating palettes.
//!
//! [`ColorPalette`] is an indirection: model elements store an index into
//! it instead of a color. [`StylePalette`] is only a per-page summary of
//! distinct styles; nothing resolves styles through it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::model::StyleTuple;

/// Document-scoped map from color to a stable index, in first-seen order.
///
/// One instance per extraction call. Entries are never removed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorPalette {
    entries: IndexMap<Rgb, usize>,
}

impl ColorPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `color`, appending it if it has not been seen before.
    pub fn index_of(&mut self, color: Rgb) -> usize {
        if let Some(&index) = self.entries.get(&color) {
            return index;
        }
        let index = self.next_index();
        self.entries.insert(color, index);
        index
    }

    /// Index of `color` without inserting it.
    pub fn get(&self, color: Rgb) -> Option<usize> {
        self.entries.get(&color).copied()
    }

    /// Reverse lookup: the color stored under `index`.
    ///
    /// Entries are unique by color, so at most one match exists.
    pub fn color_at(&self, index: usize) -> Option<Rgb> {
        self.entries
            .iter()
            .find_map(|(color, &i)| (i == index).then_some(*color))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Rgb, usize)> + '_ {
        self.entries.iter().map(|(color, &index)| (*color, index))
    }

    // Palettes read back from an edited record may have gaps or reordered
    // indices, so new entries go after the largest index in use.
    fn next_index(&self) -> usize {
        self.entries.values().max().map_or(0, |max| max + 1)
    }
}

/// Page-scoped list of distinct [`StyleTuple`]s, in first-seen order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StylePalette {
    styles: Vec<StyleTuple>,
}

impl StylePalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `style`, returning `true` if it was not already present.
    pub fn record(&mut self, style: &StyleTuple) -> bool {
        if self.styles.contains(style) {
            return false;
        }
        self.styles.push(style.clone());
        true
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StyleTuple> {
        self.styles.iter()
    }
}
