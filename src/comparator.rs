//! Tolerance-aware price ranking.
//!
//! Two prices closer than the comparator's precision are the same price.
//! Buy ranks the higher price first, Sell ranks the lower price first, and
//! Sell's ordering is the exact reverse of Buy's over the same tolerance.

use std::cmp::Ordering;

use crate::error::{BookError, Result};
use crate::{Price, Side};

/// Smallest representable tick of a traded pair.
pub const PRECISION: f64 = 1e-8;

/// Ranks prices for one side of the book.
///
/// `Ordering::Less` means the first price ranks before (is better than) the
/// second. The precision is fixed for the lifetime of the comparator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceComparator {
    precision: f64,
}

impl PriceComparator {
    /// Create a comparator with a custom tick size.
    ///
    /// Fails with [`BookError::InvalidPrecision`] unless `precision` is
    /// finite and strictly positive.
    pub fn new(precision: f64) -> Result<Self> {
        if !precision.is_finite() || precision <= 0.0 {
            return Err(BookError::InvalidPrecision(precision));
        }
        Ok(Self { precision })
    }

    #[inline]
    pub fn precision(&self) -> f64 {
        self.precision
    }

    /// Rank `p1` against `p2` for `side`.
    #[inline]
    pub fn compare(&self, side: Side, p1: Price, p2: Price) -> Ordering {
        let buy = self.compare_buy(p1, p2);
        match side {
            Side::Buy => buy,
            Side::Sell => buy.reverse(),
        }
    }

    /// True when the two prices are the same key.
    #[inline]
    pub fn same_price(&self, p1: Price, p2: Price) -> bool {
        self.compare_buy(p1, p2) == Ordering::Equal
    }

    /// True when `bid` is at least `ask`, allowing for tolerance.
    #[inline]
    pub fn crosses(&self, bid: Price, ask: Price) -> bool {
        self.compare_buy(bid, ask) != Ordering::Greater
    }

    fn compare_buy(&self, p1: Price, p2: Price) -> Ordering {
        let d = p2 - p1;
        if d >= self.precision {
            Ordering::Greater
        } else if d <= -self.precision {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }
}

impl Default for PriceComparator {
    fn default() -> Self {
        Self {
            precision: PRECISION,
        }
    }
}
