//! PriceIndex: one side of the book, price → level, ordered best first.
//!
//! Two backends satisfy the same contract:
//!
//! - [`TreeIndex`]: a B-tree, O(log n) lookup/upsert/delete.
//! - [`UnrolledIndex`]: sorted fixed-capacity buckets, better locality for
//!   books that are read far more often than their depth changes.
//!
//! Keys compare through the side's [`PriceComparator`], so two prices within
//! the precision are one key. The first price stored for a key stays the
//! key; later upserts at a noisy equal price are re-keyed to it.

mod btree;
mod unrolled;

pub use btree::{DEFAULT_BRANCHING, TreeIndex};
pub use unrolled::{DEFAULT_BUCKET_CAPACITY, DEFAULT_CAPACITY_HINT, UnrolledIndex};

use std::cmp::Ordering;
use std::fmt;

use crate::{Price, PriceComparator, PriceLevel, Side};

/// Ordered price → level mapping for one side.
///
/// Implementations never hold two levels that compare equal, and
/// [`iter_best_first`](PriceIndex::iter_best_first) yields strictly
/// decreasing prices for Buy and strictly increasing prices for Sell.
pub trait PriceIndex: fmt::Debug + Send {
    /// Which side this index ranks for.
    fn side(&self) -> Side;

    /// The comparator keys are ordered by.
    fn comparator(&self) -> PriceComparator;

    /// Number of distinct price levels.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Level at `price` (within tolerance), if any.
    fn get(&self, price: Price) -> Option<&PriceLevel>;

    /// Mutable access to the level at `price`.
    ///
    /// The level's price cannot change through this reference, so the
    /// index ordering stays valid.
    fn get_mut(&mut self, price: Price) -> Option<&mut PriceLevel>;

    /// Insert `level`, or replace the level that compares equal to it.
    ///
    /// Returns the replaced level.
    fn upsert(&mut self, level: PriceLevel) -> Option<PriceLevel>;

    /// Remove the level at `price`. No-op (returns `None`) if absent.
    fn delete(&mut self, price: Price) -> Option<PriceLevel>;

    /// Fresh best-first traversal of the current levels.
    fn iter_best_first(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_>;

    /// The best level (highest bid or lowest ask).
    fn best(&self) -> Option<&PriceLevel> {
        self.iter_best_first().next()
    }

    /// Remove every level.
    fn clear(&mut self);
}

impl<I: PriceIndex + ?Sized> PriceIndex for Box<I> {
    fn side(&self) -> Side {
        (**self).side()
    }

    fn comparator(&self) -> PriceComparator {
        (**self).comparator()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn get(&self, price: Price) -> Option<&PriceLevel> {
        (**self).get(price)
    }

    fn get_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        (**self).get_mut(price)
    }

    fn upsert(&mut self, level: PriceLevel) -> Option<PriceLevel> {
        (**self).upsert(level)
    }

    fn delete(&mut self, price: Price) -> Option<PriceLevel> {
        (**self).delete(price)
    }

    fn iter_best_first(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        (**self).iter_best_first()
    }

    fn best(&self) -> Option<&PriceLevel> {
        (**self).best()
    }

    fn clear(&mut self) {
        (**self).clear()
    }
}

/// Which backend an index is built on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Backend {
    #[default]
    BTree,
    Unrolled,
}

impl Backend {
    /// Build an empty index for `side`.
    pub fn build(
        self,
        side: Side,
        comparator: PriceComparator,
        tuning: &IndexTuning,
    ) -> Box<dyn PriceIndex> {
        match self {
            Backend::BTree => Box::new(TreeIndex::with_branching(
                side,
                comparator,
                tuning.branching,
            )),
            Backend::Unrolled => Box::new(UnrolledIndex::with_bucket_capacity(
                side,
                comparator,
                tuning.bucket_capacity,
                tuning.capacity_hint,
            )),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::BTree => write!(f, "btree"),
            Backend::Unrolled => write!(f, "unrolled"),
        }
    }
}

/// Backend tuning knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexTuning {
    /// Max children per B-tree node.
    pub branching: usize,
    /// Max levels per unrolled-list bucket.
    pub bucket_capacity: usize,
    /// Expected number of distinct levels, used to pre-size buckets.
    pub capacity_hint: usize,
}

impl Default for IndexTuning {
    fn default() -> Self {
        Self {
            branching: DEFAULT_BRANCHING,
            bucket_capacity: DEFAULT_BUCKET_CAPACITY,
            capacity_hint: DEFAULT_CAPACITY_HINT,
        }
    }
}

/// Binary search of a best-first sorted run of levels.
///
/// `Ok(i)` when `levels[i]` is the first level equal to `price`, otherwise
/// `Err(i)` with the insertion point.
///
/// Stored keys sit at least one precision apart, so a price can be equal to
/// two neighbouring keys. Both backends resolve that tie to the better
/// ranked key, the first one in best-first order.
pub(crate) fn search(
    levels: &[PriceLevel],
    price: Price,
    comparator: PriceComparator,
    side: Side,
) -> Result<usize, usize> {
    let i = levels.partition_point(|level| ranks_before(comparator, side, level.price(), price));
    match levels.get(i) {
        Some(level) if comparator.same_price(level.price(), price) => Ok(i),
        _ => Err(i),
    }
}

/// Swap `level` into `slot`, keeping the stored key's price.
pub(crate) fn replace_keyed(slot: &mut PriceLevel, mut level: PriceLevel) -> PriceLevel {
    level.rekey(slot.price());
    std::mem::replace(slot, level)
}

/// True when `a` ranks strictly before `b`.
#[inline]
pub(crate) fn ranks_before(comparator: PriceComparator, side: Side, a: Price, b: Price) -> bool {
    comparator.compare(side, a, b) == Ordering::Less
}
