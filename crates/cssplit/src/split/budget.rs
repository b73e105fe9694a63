//! Selector budget of the fragment under construction.

/// Running selector count, bounded by a maximum.
///
/// The count never exceeds the maximum: callers ask [`fits`](Self::fits)
/// before they [`charge`](Self::charge).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    max: usize,
    used: usize,
}

impl Budget {
    /// Create an empty budget.
    pub fn new(max: usize) -> Self {
        Self { max, used: 0 }
    }

    /// The maximum.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Selectors charged so far.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Selectors still available.
    pub fn remaining(&self) -> usize {
        self.max - self.used
    }

    /// Whether nothing has been charged yet.
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Whether `weight` more selectors fit.
    pub fn fits(&self, weight: usize) -> bool {
        weight <= self.remaining()
    }

    /// Charge `weight` selectors.
    pub fn charge(&mut self, weight: usize) {
        debug_assert!(self.fits(weight), "budget overflow");
        self.used = (self.used + weight).min(self.max);
    }

    /// Start over for the next fragment.
    pub fn reset(&mut self) {
        self.used = 0;
    }
}
