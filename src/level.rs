//! PriceLevel: A FIFO queue of order fragments at a single price point.
//!
//! The level stores the fragments themselves (id, sequence, remaining
//! quantity). Which side it belongs to is decided by the index holding it.

use std::collections::VecDeque;

use crate::error::{BookError, Result};
use crate::{OrderId, Price, Quantity, Sequence};

/// One resting order's contribution at a price level.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderFragment {
    pub id: OrderId,
    pub sequence: Sequence,
    pub quantity: Quantity,
}

impl OrderFragment {
    pub fn new(id: impl Into<OrderId>, sequence: Sequence, quantity: Quantity) -> Self {
        Self {
            id: id.into(),
            sequence,
            quantity,
        }
    }
}

/// All fragments resting at one price on one side.
///
/// Fragments are kept in sequence order, which is arrival order when the
/// caller hands out increasing sequences. An id appears at most once.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceLevel {
    price: Price,
    fragments: VecDeque<OrderFragment>,
}

impl PriceLevel {
    /// Create a new empty level at the given price.
    pub fn new(price: Price) -> Self {
        Self {
            price,
            fragments: VecDeque::new(),
        }
    }

    /// Create a level holding a single fragment.
    pub fn with_order(price: Price, fragment: OrderFragment) -> Self {
        let mut fragments = VecDeque::with_capacity(4);
        fragments.push_back(fragment);
        Self { price, fragments }
    }

    #[inline]
    pub fn price(&self) -> Price {
        self.price
    }

    /// Re-key the level to the canonical price already stored in an index.
    pub(crate) fn rekey(&mut self, price: Price) {
        self.price = price;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of resting fragments.
    #[inline]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Sum of remaining quantities.
    pub fn total_quantity(&self) -> Quantity {
        self.fragments.iter().map(|f| f.quantity).sum()
    }

    /// The fragment with time priority.
    #[inline]
    pub fn front(&self) -> Option<&OrderFragment> {
        self.fragments.front()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.fragments.iter().any(|f| f.id == id)
    }

    /// Fragments in FIFO order.
    pub fn iter(&self) -> impl Iterator<Item = &OrderFragment> + '_ {
        self.fragments.iter()
    }

    /// Add a fragment, keeping sequence order.
    ///
    /// Returns the new fragment count, or `DuplicateOrder` (level untouched)
    /// if the id already rests here.
    pub fn add_order(
        &mut self,
        id: impl Into<OrderId>,
        sequence: Sequence,
        quantity: Quantity,
    ) -> Result<usize> {
        let id = id.into();
        // Queues stay short (tens of orders), a scan beats a side index.
        if self.contains(id.as_str()) {
            return Err(BookError::DuplicateOrder {
                id,
                price: self.price,
            });
        }
        let at = self.fragments.partition_point(|f| f.sequence <= sequence);
        self.fragments
            .insert(at, OrderFragment::new(id, sequence, quantity));
        Ok(self.fragments.len())
    }

    /// Remove exactly the fragment with this id.
    ///
    /// Returns the removed fragment and the remaining count. Surviving
    /// fragments keep their relative order.
    pub fn remove_order(&mut self, id: &str) -> Result<(OrderFragment, usize)> {
        let pos = self
            .fragments
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| BookError::OrderNotFound {
                id: OrderId::from(id),
                price: self.price,
            })?;
        let fragment = self
            .fragments
            .remove(pos)
            .ok_or_else(|| BookError::OrderNotFound {
                id: OrderId::from(id),
                price: self.price,
            })?;
        Ok((fragment, self.fragments.len()))
    }
}
