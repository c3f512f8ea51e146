//! Override watcher: edge detection on the polled state symbol.
//!
//! ```text
//!            observe(non-neutral)  ──▶ Triggered
//!   ┌─────────┐ ──────────────────────────────▶ ┌──────────────────┐
//!   │ Neutral │                                 │ Active-NonNeutral│
//!   └─────────┘ ◀────────────────────────────── └──────────────────┘
//!                    observe(neutral)
//! ```
//!
//! "Nothing observed yet" counts as Neutral. Only the Neutral →
//! Active-NonNeutral transition fires; staying on a non-neutral symbol,
//! or hopping between two non-neutral symbols, does not.

/// Last observed state symbol, threaded explicitly through each decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideState {
    last: Option<char>,
}

/// Result of feeding one poll into the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// The state moved from neutral to this non-neutral symbol.
    Triggered(char),
    /// No qualifying transition.
    Steady,
}

impl OverrideState {
    pub const fn new() -> Self {
        Self { last: None }
    }

    pub const fn with_last(symbol: char) -> Self {
        Self { last: Some(symbol) }
    }

    /// Last symbol actually observed, if any.
    pub fn last(&self) -> Option<char> {
        self.last
    }

    pub fn is_neutral(&self, neutral: char) -> bool {
        self.last.is_none_or(|c| c == neutral)
    }

    /// Feed one poll result. `None` (source unreadable) never fires and
    /// leaves the memory untouched.
    pub fn observe(self, observed: Option<char>, neutral: char) -> (Edge, Self) {
        let Some(symbol) = observed else {
            return (Edge::Steady, self);
        };
        let edge = if symbol != neutral && self.is_neutral(neutral) {
            Edge::Triggered(symbol)
        } else {
            Edge::Steady
        };
        (edge, Self { last: Some(symbol) })
    }
}
