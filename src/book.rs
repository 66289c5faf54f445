//! OrderBook: both sides of one symbol's book.
//!
//! Combines:
//! - Buys, ranked high → low
//! - Sells, ranked low → high
//! - One comparator shared by both sides
//!
//! Every level lives in exactly one side's index. The book never matches;
//! crossing orders simply rest until [`OrderBook::overlapped_range`] is
//! asked to resolve them.

use log::{debug, trace, warn};

use crate::error::{BookError, Result};
#[cfg(feature = "event-log")]
use crate::event::Event;
use crate::index::{Backend, IndexTuning, PriceIndex, TreeIndex};
use crate::{OrderFragment, OrderId, Price, PriceComparator, PriceLevel, Quantity, Sequence, Side};

/// The order book for one symbol.
///
/// Generic over the index backend. The default is the B-tree; use
/// [`DynOrderBook`] to pick the backend at runtime.
///
/// With the `event-log` feature every successful mutation is appended to an
/// in-memory log that is never trimmed on its own. Persist it and call
/// [`clear_events`](OrderBook::clear_events) to bound memory.
#[derive(Clone, Debug)]
pub struct OrderBook<I: PriceIndex = TreeIndex> {
    /// Buy levels, best (highest) first
    buys: I,
    /// Sell levels, best (lowest) first
    sells: I,
    comparator: PriceComparator,
    /// Successful mutations, in order. Grows until `clear_events`.
    #[cfg(feature = "event-log")]
    pub(crate) events: Vec<Event>,
}

/// A book whose backend was chosen at runtime.
pub type DynOrderBook = OrderBook<Box<dyn PriceIndex>>;

impl OrderBook<TreeIndex> {
    /// Create an empty B-tree book with the default precision.
    pub fn new() -> Self {
        Self::with_comparator(PriceComparator::default())
    }

    /// Create an empty B-tree book with a custom tick size.
    pub fn with_precision(precision: f64) -> Result<Self> {
        Ok(Self::with_comparator(PriceComparator::new(precision)?))
    }

    pub fn with_comparator(comparator: PriceComparator) -> Self {
        Self::with_indices(
            TreeIndex::new(Side::Buy, comparator),
            TreeIndex::new(Side::Sell, comparator),
        )
    }
}

impl Default for OrderBook<TreeIndex> {
    fn default() -> Self {
        Self::new()
    }
}

impl DynOrderBook {
    /// Create an empty book on the given backend.
    pub fn with_backend(
        backend: Backend,
        comparator: PriceComparator,
        tuning: &IndexTuning,
    ) -> Self {
        Self::with_indices(
            backend.build(Side::Buy, comparator, tuning),
            backend.build(Side::Sell, comparator, tuning),
        )
    }

    /// Create an empty book as described by a loaded config.
    #[cfg(feature = "config")]
    pub fn from_config(config: &crate::BookConfig) -> Result<Self> {
        Ok(Self::with_backend(
            config.book.backend,
            config.comparator()?,
            &config.tuning(),
        ))
    }
}

impl<I: PriceIndex> OrderBook<I> {
    /// Assemble a book from two empty indices, one per side.
    ///
    /// Both indices must share one comparator.
    pub fn with_indices(buys: I, sells: I) -> Self {
        debug_assert_eq!(buys.side(), Side::Buy);
        debug_assert_eq!(sells.side(), Side::Sell);
        debug_assert_eq!(buys.comparator(), sells.comparator());
        let comparator = buys.comparator();
        Self {
            buys,
            sells,
            comparator,
            #[cfg(feature = "event-log")]
            events: Vec::new(),
        }
    }

    // === Side access ===

    /// The index holding one side.
    pub fn index(&self, side: Side) -> &I {
        match side {
            Side::Buy => &self.buys,
            Side::Sell => &self.sells,
        }
    }

    fn index_mut(&mut self, side: Side) -> &mut I {
        match side {
            Side::Buy => &mut self.buys,
            Side::Sell => &mut self.sells,
        }
    }

    #[inline]
    pub fn comparator(&self) -> PriceComparator {
        self.comparator
    }

    // === Order management ===

    /// Rest an order fragment on `side` at `price`.
    ///
    /// Joins the existing level when one is within tolerance of `price`,
    /// otherwise creates a level. Returns the level now holding the order.
    ///
    /// # Errors
    ///
    /// - [`BookError::InvalidPrice`] / [`BookError::InvalidQuantity`] for
    ///   NaN, infinite, non-positive prices or negative quantities.
    /// - [`BookError::DuplicateOrder`] if `id` already rests at that level.
    ///
    /// The book is unchanged on error.
    pub fn insert_order(
        &mut self,
        id: impl Into<OrderId>,
        side: Side,
        sequence: Sequence,
        price: Price,
        quantity: Quantity,
    ) -> Result<&PriceLevel> {
        validate(price, quantity)?;
        let id = id.into();

        let index = self.index_mut(side);
        match index.get_mut(price) {
            Some(level) => {
                level.add_order(id.clone(), sequence, quantity)?;
            }
            None => {
                debug!("creating {side} level at {price}");
                let fragment = OrderFragment::new(id.clone(), sequence, quantity);
                index.upsert(PriceLevel::with_order(price, fragment));
            }
        }

        if self.index(side).get(price).is_none() {
            warn!("{side} index lost level at {price} after inserting order {id}");
            return Err(BookError::InsertFailed { id, side, price });
        }
        trace!("inserted order {id} seq {sequence} qty {quantity} at {side} {price}");

        #[cfg(feature = "event-log")]
        self.events.push(Event::Insert {
            id: id.clone(),
            side,
            sequence,
            price,
            quantity,
        });

        self.index(side)
            .get(price)
            .ok_or(BookError::InsertFailed { id, side, price })
    }

    /// Remove order `id` from the `side` level at `price`.
    ///
    /// Deletes the level when its last fragment leaves. Returns the removed
    /// fragment.
    ///
    /// # Errors
    ///
    /// - [`BookError::PriceLevelNotFound`] if no level exists there.
    /// - [`BookError::OrderNotFound`] if the level does not hold `id`.
    pub fn remove_order(&mut self, id: &str, side: Side, price: Price) -> Result<OrderFragment> {
        let index = self.index_mut(side);
        let level = index
            .get_mut(price)
            .ok_or(BookError::PriceLevelNotFound { side, price })?;
        // The stored key, not `price`: a query can be equal to two keys.
        let key = level.price();
        let (fragment, remaining) = level.remove_order(id)?;
        if remaining == 0 {
            index.delete(key);
            debug!("deleted empty {side} level at {key}");
        }
        trace!("removed order {id} from {side} {price}");

        #[cfg(feature = "event-log")]
        self.events.push(Event::Remove {
            id: fragment.id.clone(),
            side,
            price,
        });

        Ok(fragment)
    }

    /// Drop every level on both sides (and the event log).
    pub fn clear(&mut self) {
        self.buys.clear();
        self.sells.clear();
        #[cfg(feature = "event-log")]
        self.events.clear();
    }

    // === Inspection ===

    /// Highest resting buy price.
    pub fn best_bid(&self) -> Option<Price> {
        self.buys.best().map(PriceLevel::price)
    }

    /// Lowest resting sell price.
    pub fn best_ask(&self) -> Option<Price> {
        self.sells.best().map(PriceLevel::price)
    }

    /// True when the best bid is at least the best ask (within tolerance).
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => self.comparator.crosses(bid, ask),
            _ => false,
        }
    }

    /// The level at `price` on `side`, within tolerance.
    pub fn level(&self, side: Side, price: Price) -> Option<&PriceLevel> {
        self.index(side).get(price)
    }

    /// Levels on `side`, best first.
    pub fn levels(&self, side: Side) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        self.index(side).iter_best_first()
    }

    /// Number of distinct prices on `side`.
    pub fn level_count(&self, side: Side) -> usize {
        self.index(side).len()
    }

    /// Number of resting fragments on `side`.
    pub fn order_count(&self, side: Side) -> usize {
        self.levels(side).map(PriceLevel::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buys.is_empty() && self.sells.is_empty()
    }
}

fn validate(price: Price, quantity: Quantity) -> Result<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(BookError::InvalidPrice(price));
    }
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(BookError::InvalidQuantity(quantity));
    }
    Ok(())
}
