//! Event log for deterministic replay.
//!
//! Every successful mutation of a book is recorded as an event (feature
//! `event-log`). Replaying the same events on an empty book produces an
//! identical book, which is what [`persistence`](crate::persistence) relies
//! on.

use crate::error::Result;
use crate::index::PriceIndex;
use crate::{OrderBook, OrderId, Price, PriceComparator, Quantity, Sequence, Side};

/// An input that can be applied to a book.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Event {
    /// Rest an order fragment
    Insert {
        id: OrderId,
        side: Side,
        sequence: Sequence,
        price: Price,
        quantity: Quantity,
    },
    /// Take an order fragment off a level
    Remove { id: OrderId, side: Side, price: Price },
}

impl Event {
    pub fn insert(
        id: impl Into<OrderId>,
        side: Side,
        sequence: Sequence,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Event::Insert {
            id: id.into(),
            side,
            sequence,
            price,
            quantity,
        }
    }

    pub fn remove(id: impl Into<OrderId>, side: Side, price: Price) -> Self {
        Event::Remove {
            id: id.into(),
            side,
            price,
        }
    }

    pub fn side(&self) -> Side {
        match self {
            Event::Insert { side, .. } | Event::Remove { side, .. } => *side,
        }
    }
}

impl<I: PriceIndex> OrderBook<I> {
    /// Apply a single event.
    ///
    /// A successful event is recorded in the log like a direct call would be;
    /// a failed one changes nothing.
    pub fn apply(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::Insert {
                id,
                side,
                sequence,
                price,
                quantity,
            } => self
                .insert_order(id.clone(), *side, *sequence, *price, *quantity)
                .map(|_| ()),
            Event::Remove { id, side, price } => {
                self.remove_order(id.as_str(), *side, *price).map(|_| ())
            }
        }
    }

    /// Apply events in order, stopping at the first failure.
    pub fn apply_all(&mut self, events: &[Event]) -> Result<()> {
        events.iter().try_for_each(|event| self.apply(event))
    }

    /// Rebuild from an event log onto this book, usually an empty one.
    ///
    /// The book keeps its own backend and comparator, so a log recorded under
    /// one precision must be replayed onto a book with that precision.
    pub fn replay_into(mut self, events: &[Event]) -> Result<Self> {
        self.apply_all(events)?;
        Ok(self)
    }

    /// Recorded events, oldest first.
    ///
    /// The log only grows: every successful insert and remove appends one
    /// event. Long-running books should persist and then
    /// [`clear_events`](Self::clear_events) periodically.
    #[cfg(feature = "event-log")]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Clear the event log.
    ///
    /// Useful after persisting events to external storage. The book itself
    /// is untouched.
    #[cfg(feature = "event-log")]
    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl OrderBook {
    /// Rebuild a B-tree book under `comparator` from an event log.
    ///
    /// Use [`replay_into`](OrderBook::replay_into) for another backend.
    pub fn replay(comparator: PriceComparator, events: &[Event]) -> Result<Self> {
        Self::with_comparator(comparator).replay_into(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BookError;

    #[test]
    fn event_constructors() {
        let insert = Event::insert("a", Side::Buy, 1, 10.0, 2.0);
        assert!(matches!(insert, Event::Insert { sequence: 1, .. }));
        assert_eq!(insert.side(), Side::Buy);

        let remove = Event::remove("a", Side::Sell, 10.0);
        assert!(matches!(remove, Event::Remove { .. }));
        assert_eq!(remove.side(), Side::Sell);
    }

    #[test]
    fn apply_insert_and_remove() {
        let mut book = OrderBook::new();

        book.apply(&Event::insert("a", Side::Buy, 1, 10.0, 2.0))
            .unwrap();
        assert_eq!(book.best_bid(), Some(10.0));

        book.apply(&Event::remove("a", Side::Buy, 10.0)).unwrap();
        assert!(book.is_empty());
    }

    #[test]
    fn apply_all_stops_at_first_failure() {
        let mut book = OrderBook::new();
        let events = vec![
            Event::insert("a", Side::Sell, 1, 5.0, 1.0),
            Event::remove("missing", Side::Sell, 5.0),
            Event::insert("b", Side::Sell, 2, 6.0, 1.0),
        ];

        let err = book.apply_all(&events).unwrap_err();
        assert!(matches!(err, BookError::OrderNotFound { .. }));
        assert_eq!(book.level_count(Side::Sell), 1);
    }

    #[cfg(feature = "event-log")]
    #[test]
    fn direct_calls_are_recorded() {
        let mut book = OrderBook::new();
        book.insert_order("a", Side::Buy, 1, 10.0, 1.0).unwrap();
        book.insert_order("b", Side::Sell, 2, 11.0, 1.0).unwrap();
        book.remove_order("a", Side::Buy, 10.0).unwrap();

        assert_eq!(
            book.events(),
            &[
                Event::insert("a", Side::Buy, 1, 10.0, 1.0),
                Event::insert("b", Side::Sell, 2, 11.0, 1.0),
                Event::remove("a", Side::Buy, 10.0),
            ]
        );
    }

    #[cfg(feature = "event-log")]
    #[test]
    fn failures_are_not_recorded() {
        let mut book = OrderBook::new();
        book.insert_order("a", Side::Buy, 1, 10.0, 1.0).unwrap();
        let _ = book.insert_order("a", Side::Buy, 2, 10.0, 1.0);
        let _ = book.remove_order("a", Side::Sell, 10.0);
        let _ = book.insert_order("x", Side::Buy, 3, -1.0, 1.0);

        assert_eq!(book.events().len(), 1);
    }

    #[cfg(feature = "event-log")]
    #[test]
    fn replay_produces_identical_book() {
        let mut original = OrderBook::new();
        original.insert_order("s1", Side::Sell, 1, 10.4, 5.0).unwrap();
        original.insert_order("s2", Side::Sell, 2, 10.0, 1.0).unwrap();
        original.insert_order("b1", Side::Buy, 3, 10.5, 3.0).unwrap();
        original.insert_order("b2", Side::Buy, 4, 10.2, 2.0).unwrap();
        original.insert_order("b3", Side::Buy, 5, 10.2, 1.0).unwrap();
        original.remove_order("b2", Side::Buy, 10.2).unwrap();

        let replayed = OrderBook::replay(original.comparator(), original.events()).unwrap();

        assert_eq!(original.full_depth(), replayed.full_depth());
        assert_eq!(original.overlapped_range(), replayed.overlapped_range());
        assert_eq!(original.events(), replayed.events());
    }

    #[cfg(feature = "event-log")]
    #[test]
    fn replay_keeps_coarse_precision() {
        let comparator = PriceComparator::new(0.01).unwrap();
        let mut original = OrderBook::with_comparator(comparator);
        original.insert_order("a", Side::Buy, 1, 1.001, 1.0).unwrap();
        original.insert_order("b", Side::Buy, 2, 1.004, 1.0).unwrap();
        original.insert_order("c", Side::Sell, 3, 1.0, 2.0).unwrap();
        assert_eq!(original.level_count(Side::Buy), 1);

        let replayed = OrderBook::replay(comparator, original.events()).unwrap();
        assert_eq!(replayed.comparator(), comparator);
        assert_eq!(replayed.level_count(Side::Buy), 1);
        assert_eq!(original.full_depth(), replayed.full_depth());
        assert_eq!(original.overlapped_range(), replayed.overlapped_range());

        // Under the default precision the same log splits the bid level.
        let fine = OrderBook::replay(PriceComparator::default(), original.events()).unwrap();
        assert_eq!(fine.level_count(Side::Buy), 2);
    }

    #[cfg(feature = "event-log")]
    #[test]
    fn replay_into_keeps_backend() {
        use crate::{Backend, DynOrderBook, IndexTuning};

        let comparator = PriceComparator::new(1e-4).unwrap();
        let tuning = IndexTuning {
            bucket_capacity: 2,
            ..IndexTuning::default()
        };
        let mut original = DynOrderBook::with_backend(Backend::Unrolled, comparator, &tuning);
        for i in 0..20u64 {
            let price = 5.0 + i as f64 * 0.001;
            original.insert_order(format!("s{i}"), Side::Sell, i, price, 1.0).unwrap();
            original.insert_order(format!("t{i}"), Side::Sell, 100 + i, price + 5e-5, 1.0).unwrap();
        }
        original.remove_order("s3", Side::Sell, 5.003).unwrap();

        let replayed = DynOrderBook::with_backend(Backend::Unrolled, comparator, &tuning)
            .replay_into(original.events())
            .unwrap();
        assert_eq!(replayed.level_count(Side::Sell), 20);
        assert_eq!(original.full_depth(), replayed.full_depth());
        assert_eq!(original.events(), replayed.events());
    }

    #[cfg(feature = "event-log")]
    #[test]
    fn clear_events_keeps_state() {
        let mut book = OrderBook::new();
        book.insert_order("a", Side::Buy, 1, 10.0, 1.0).unwrap();
        book.insert_order("b", Side::Buy, 2, 10.0, 1.0).unwrap();
        book.remove_order("a", Side::Buy, 10.0).unwrap();
        assert_eq!(book.events().len(), 3);

        book.clear_events();
        assert!(book.events().is_empty());
        assert_eq!(book.best_bid(), Some(10.0));

        // Logging resumes from the cleared point.
        book.insert_order("c", Side::Sell, 3, 11.0, 1.0).unwrap();
        assert_eq!(book.events(), &[Event::insert("c", Side::Sell, 3, 11.0, 1.0)]);
    }
}
