//! The degrade-and-log policy.
//!
//! Page sub-extractions and element placements run through
//! [`Degrade::attempt`]. A failure is logged, recorded, and turned into
//! [`Outcome::Skipped`]; it never propagates past that boundary. The
//! recorded failures become the [`Report`] returned next to the result.

use std::fmt;

use pdfedit_core::ItemError;
use tracing::warn;

/// Result of one attempted item.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    Skipped(ItemError),
}

impl<T> Outcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    /// The value, or `None` if the item was skipped.
    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            Outcome::Skipped(_) => None,
        }
    }
}

impl<T: Default> Outcome<T> {
    /// The value, or `T::default()` (an empty list) if the item was skipped.
    pub fn or_empty(self) -> T {
        self.done().unwrap_or_default()
    }
}

/// Collects skipped items for one call.
#[derive(Debug, Default)]
pub struct Degrade {
    skipped: Vec<ItemError>,
}

impl Degrade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one item. Failures are logged at `warn` and recorded.
    pub fn attempt<T>(&mut self, item: impl FnOnce() -> Result<T, ItemError>) -> Outcome<T> {
        match item() {
            Ok(value) => Outcome::Done(value),
            Err(err) => {
                log_skipped(&err);
                self.skipped.push(err.clone());
                Outcome::Skipped(err)
            }
        }
    }

    /// Record an item that failed before it could be attempted.
    pub fn skip(&mut self, err: ItemError) {
        log_skipped(&err);
        self.skipped.push(err);
    }

    pub fn into_report(self) -> Report {
        Report {
            skipped: self.skipped,
        }
    }
}

fn log_skipped(err: &ItemError) {
    match err {
        ItemError::PageExtraction {
            page,
            stage,
            reason,
        } => warn!(page, stage = %stage, reason = %reason, "page sub-extraction skipped"),
        ItemError::ElementPlacement {
            page,
            element,
            index,
            reason,
        } => warn!(page, element = %element, index, reason = %reason, "element skipped"),
        ItemError::Validation { page, reason } => {
            warn!(page, reason = %reason, "page record skipped")
        }
    }
}

/// Items skipped during one extraction or reconstruction call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    skipped: Vec<ItemError>,
}

impl Report {
    /// `true` when nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn len(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn skipped(&self) -> &[ItemError] {
        &self.skipped
    }

    /// Skipped items of one page.
    pub fn for_page(&self, page: usize) -> impl Iterator<Item = &ItemError> + '_ {
        self.skipped.iter().filter(move |e| e.page() == page)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped.is_empty() {
            return f.write_str("no items skipped");
        }
        writeln!(f, "{} item(s) skipped:", self.skipped.len())?;
        for err in &self.skipped {
            writeln!(f, "  {err}")?;
        }
        Ok(())
    }
}
