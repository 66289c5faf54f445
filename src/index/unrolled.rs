//! Unrolled-list backend: a run of small sorted buckets, best first.
//!
//! Buckets are never empty. A full bucket splits in half before an insert,
//! and a bucket falling under half capacity folds into a neighbour when the
//! two fit in one.

use super::{PriceIndex, ranks_before, replace_keyed, search};
use crate::{Price, PriceComparator, PriceLevel, Side};

/// Default max levels per bucket.
pub const DEFAULT_BUCKET_CAPACITY: usize = 16;

/// Default expected level count used to pre-size the bucket list.
pub const DEFAULT_CAPACITY_HINT: usize = 4096;

/// Price levels for one side, held in sorted fixed-capacity buckets.
#[derive(Clone, Debug)]
pub struct UnrolledIndex {
    buckets: Vec<Vec<PriceLevel>>,
    len: usize,
    bucket_capacity: usize,
    side: Side,
    comparator: PriceComparator,
}

impl UnrolledIndex {
    pub fn new(side: Side, comparator: PriceComparator) -> Self {
        Self::with_bucket_capacity(
            side,
            comparator,
            DEFAULT_BUCKET_CAPACITY,
            DEFAULT_CAPACITY_HINT,
        )
    }

    /// Create with a custom bucket size (at least 2) and expected depth.
    pub fn with_bucket_capacity(
        side: Side,
        comparator: PriceComparator,
        bucket_capacity: usize,
        capacity_hint: usize,
    ) -> Self {
        let bucket_capacity = bucket_capacity.max(2);
        Self {
            buckets: Vec::with_capacity(capacity_hint / bucket_capacity + 1),
            len: 0,
            bucket_capacity,
            side,
            comparator,
        }
    }

    pub fn bucket_capacity(&self) -> usize {
        self.bucket_capacity
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceLevel> + '_ {
        self.buckets.iter().flatten()
    }

    /// First bucket whose worst level does not rank before `price`.
    ///
    /// Equals `buckets.len()` when `price` ranks after every stored level.
    fn bucket_for(&self, price: Price) -> usize {
        self.buckets.partition_point(|bucket| {
            bucket
                .last()
                .is_some_and(|last| ranks_before(self.comparator, self.side, last.price(), price))
        })
    }

    /// Bucket and slot holding `price`, if stored.
    ///
    /// Every level in an earlier bucket ranks strictly before `price`, so
    /// the slot found is the first equal key best-first.
    fn position(&self, price: Price) -> Option<(usize, usize)> {
        let b = self.bucket_for(price);
        let bucket = self.buckets.get(b)?;
        let i = search(bucket, price, self.comparator, self.side).ok()?;
        Some((b, i))
    }

    /// Fold the thin bucket `b` into whichever neighbour it fits with.
    fn merge_thin(&mut self, b: usize) {
        let cap = self.bucket_capacity;
        if b + 1 < self.buckets.len() && self.buckets[b].len() + self.buckets[b + 1].len() <= cap {
            let next = self.buckets.remove(b + 1);
            self.buckets[b].extend(next);
        } else if b > 0 && self.buckets[b - 1].len() + self.buckets[b].len() <= cap {
            let thin = self.buckets.remove(b);
            self.buckets[b - 1].extend(thin);
        }
    }

    /// Panics if a bucket is empty or over capacity, or keys are out of order.
    #[cfg(test)]
    pub(crate) fn assert_valid(&self) {
        use std::cmp::Ordering;

        for bucket in &self.buckets {
            assert!(!bucket.is_empty());
            assert!(bucket.len() <= self.bucket_capacity);
        }
        let prices: Vec<Price> = self.iter().map(|l| l.price()).collect();
        for pair in prices.windows(2) {
            assert_eq!(
                self.comparator.compare(self.side, pair[0], pair[1]),
                Ordering::Less
            );
        }
        assert_eq!(prices.len(), self.len);
    }
}

impl PriceIndex for UnrolledIndex {
    fn side(&self) -> Side {
        self.side
    }

    fn comparator(&self) -> PriceComparator {
        self.comparator
    }

    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, price: Price) -> Option<&PriceLevel> {
        let (b, i) = self.position(price)?;
        Some(&self.buckets[b][i])
    }

    fn get_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        let (b, i) = self.position(price)?;
        Some(&mut self.buckets[b][i])
    }

    fn upsert(&mut self, level: PriceLevel) -> Option<PriceLevel> {
        let cap = self.bucket_capacity;
        if self.buckets.is_empty() {
            let mut bucket = Vec::with_capacity(cap);
            bucket.push(level);
            self.buckets.push(bucket);
            self.len += 1;
            return None;
        }

        let mut b = self.bucket_for(level.price()).min(self.buckets.len() - 1);
        let mut i = match search(&self.buckets[b], level.price(), self.comparator, self.side) {
            Ok(i) => return Some(replace_keyed(&mut self.buckets[b][i], level)),
            Err(i) => i,
        };

        if self.buckets[b].len() >= cap {
            let half = cap / 2;
            let mut tail = Vec::with_capacity(cap);
            tail.extend(self.buckets[b].drain(half..));
            self.buckets.insert(b + 1, tail);
            if i > half {
                b += 1;
                i -= half;
            }
        }
        self.buckets[b].insert(i, level);
        self.len += 1;
        None
    }

    fn delete(&mut self, price: Price) -> Option<PriceLevel> {
        let (b, i) = self.position(price)?;
        let removed = self.buckets[b].remove(i);
        self.len -= 1;
        if self.buckets[b].is_empty() {
            self.buckets.remove(b);
        } else if self.buckets[b].len() < self.bucket_capacity / 2 {
            self.merge_thin(b);
        }
        Some(removed)
    }

    fn iter_best_first(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        Box::new(self.iter())
    }

    fn best(&self) -> Option<&PriceLevel> {
        self.buckets.first().and_then(|bucket| bucket.first())
    }

    fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }
}
