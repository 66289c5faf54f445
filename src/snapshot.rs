//! Book snapshots for inspection and display.

use crate::index::PriceIndex;
use crate::{OrderBook, Price, PriceLevel, Quantity, Side};

/// Aggregated view of the top of a book.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BookSnapshot {
    /// Buy levels (highest price first)
    pub bids: Vec<LevelSnapshot>,
    /// Sell levels (lowest price first)
    pub asks: Vec<LevelSnapshot>,
}

impl BookSnapshot {
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|l| l.price)
    }

    /// Best ask minus best bid. Negative when the book is crossed.
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Returns total bid quantity across the captured levels.
    pub fn total_bid_quantity(&self) -> Quantity {
        self.bids.iter().map(|l| l.quantity).sum()
    }

    /// Returns total ask quantity across the captured levels.
    pub fn total_ask_quantity(&self) -> Quantity {
        self.asks.iter().map(|l| l.quantity).sum()
    }
}

/// A snapshot of a single price level.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelSnapshot {
    pub price: Price,
    /// Total remaining quantity at this level
    pub quantity: Quantity,
    /// Number of fragments at this level
    pub order_count: usize,
}

impl From<&PriceLevel> for LevelSnapshot {
    fn from(level: &PriceLevel) -> Self {
        Self {
            price: level.price(),
            quantity: level.total_quantity(),
            order_count: level.len(),
        }
    }
}

impl<I: PriceIndex> OrderBook<I> {
    /// Snapshot of the best `depth` levels on each side.
    pub fn depth(&self, depth: usize) -> BookSnapshot {
        let capture = |side: Side| -> Vec<LevelSnapshot> {
            self.levels(side)
                .take(depth)
                .map(LevelSnapshot::from)
                .collect()
        };
        BookSnapshot {
            bids: capture(Side::Buy),
            asks: capture(Side::Sell),
        }
    }

    /// Snapshot of every level.
    pub fn full_depth(&self) -> BookSnapshot {
        self.depth(usize::MAX)
    }
}
