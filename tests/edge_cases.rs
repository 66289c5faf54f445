//! Edge-case tests: adversarial inputs to every public API.

use callbook::{
    Backend, BookError, Books, DynOrderBook, IndexTuning, OrderBook, PriceComparator, Side, Symbol,
};

/// The four-order book used throughout the auction examples.
fn auction_book() -> OrderBook {
    let mut book = OrderBook::new();
    book.insert_order("b1", Side::Buy, 1, 10.5, 3.0).unwrap();
    book.insert_order("b2", Side::Buy, 2, 10.2, 2.0).unwrap();
    book.insert_order("s1", Side::Sell, 3, 10.0, 1.0).unwrap();
    book.insert_order("s2", Side::Sell, 4, 10.4, 5.0).unwrap();
    book
}

// ============================================================================
// Empty book operations
// ============================================================================

#[test]
fn empty_book_queries() {
    let book = OrderBook::new();
    assert!(book.is_empty());
    assert_eq!(book.best_bid(), None);
    assert_eq!(book.best_ask(), None);
    assert!(!book.is_crossed());
    assert!(book.overlapped_range().is_empty());
    assert_eq!(book.depth(5).spread(), None);
}

#[test]
fn remove_from_empty_book() {
    let mut book = OrderBook::new();
    assert_eq!(
        book.remove_order("x", Side::Buy, 1.0),
        Err(BookError::PriceLevelNotFound {
            side: Side::Buy,
            price: 1.0
        })
    );
}

// ============================================================================
// Invalid inputs
// ============================================================================

#[test]
fn bad_prices_are_rejected() {
    let mut book = OrderBook::new();
    for price in [0.0, -1.0, f64::INFINITY, f64::NEG_INFINITY] {
        assert_eq!(
            book.insert_order("x", Side::Buy, 1, price, 1.0).unwrap_err(),
            BookError::InvalidPrice(price)
        );
    }
    assert!(matches!(
        book.insert_order("x", Side::Sell, 1, f64::NAN, 1.0),
        Err(BookError::InvalidPrice(p)) if p.is_nan()
    ));
    assert!(book.is_empty());
}

#[test]
fn bad_quantities_are_rejected() {
    let mut book = OrderBook::new();
    assert_eq!(
        book.insert_order("x", Side::Buy, 1, 1.0, -1.0).unwrap_err(),
        BookError::InvalidQuantity(-1.0)
    );
    assert!(matches!(
        book.insert_order("x", Side::Buy, 1, 1.0, f64::NAN),
        Err(BookError::InvalidQuantity(q)) if q.is_nan()
    ));
    assert!(book.is_empty());
}

#[test]
fn zero_quantity_rests() {
    let mut book = OrderBook::new();
    let level = book.insert_order("z", Side::Sell, 1, 2.0, 0.0).unwrap();
    assert_eq!(level.len(), 1);
    assert_eq!(level.total_quantity(), 0.0);
}

#[test]
fn bad_precision_is_rejected() {
    for precision in [0.0, -1e-8, f64::NAN, f64::INFINITY] {
        assert!(OrderBook::with_precision(precision).is_err());
    }
    assert!(PriceComparator::new(1e-4).is_ok());
}

// ============================================================================
// Duplicates and cancellation
// ============================================================================

#[test]
fn duplicate_leaves_book_untouched() {
    let mut book = OrderBook::new();
    book.insert_order("a", Side::Buy, 1, 3.0, 2.0).unwrap();
    let before = book.full_depth();

    // Within tolerance counts as the same level.
    let err = book.insert_order("a", Side::Buy, 2, 3.0 + 1e-9, 5.0).unwrap_err();
    assert_eq!(
        err,
        BookError::DuplicateOrder {
            id: "a".into(),
            price: 3.0
        }
    );
    assert_eq!(book.full_depth(), before);
}

#[test]
fn same_id_on_other_level_or_side_is_allowed() {
    let mut book = OrderBook::new();
    book.insert_order("a", Side::Buy, 1, 3.0, 1.0).unwrap();
    book.insert_order("a", Side::Buy, 2, 3.5, 1.0).unwrap();
    book.insert_order("a", Side::Sell, 3, 3.0, 1.0).unwrap();

    assert_eq!(book.order_count(Side::Buy), 2);
    assert_eq!(book.order_count(Side::Sell), 1);

    book.remove_order("a", Side::Sell, 3.0).unwrap();
    assert_eq!(book.order_count(Side::Buy), 2);
    assert!(book.level(Side::Sell, 3.0).is_none());
}

#[test]
fn remove_unknown_id_keeps_level() {
    let mut book = OrderBook::new();
    book.insert_order("a", Side::Sell, 1, 4.0, 1.0).unwrap();

    assert_eq!(
        book.remove_order("b", Side::Sell, 4.0),
        Err(BookError::OrderNotFound {
            id: "b".into(),
            price: 4.0
        })
    );
    assert_eq!(book.level_count(Side::Sell), 1);
}

#[test]
fn remove_on_wrong_side_fails() {
    let mut book = OrderBook::new();
    book.insert_order("a", Side::Sell, 1, 4.0, 1.0).unwrap();
    assert!(matches!(
        book.remove_order("a", Side::Buy, 4.0),
        Err(BookError::PriceLevelNotFound { .. })
    ));
}

#[test]
fn remove_within_tolerance_deletes_level() {
    let mut book = OrderBook::new();
    book.insert_order("a", Side::Buy, 1, 10.0, 1.0).unwrap();

    let fragment = book.remove_order("a", Side::Buy, 10.0 + 5e-9).unwrap();
    assert_eq!(fragment.id.as_str(), "a");
    assert!(book.is_empty());
}

#[test]
fn remove_between_two_keys_deletes_the_level_it_emptied() {
    let tuning = IndexTuning {
        branching: 4,
        bucket_capacity: 2,
        capacity_hint: 0,
    };
    // 1.5 precisions apart, so each midpoint is equal to two keys.
    let key = |i: usize| 1.0 + i as f64 * 1.5e-8;

    for backend in [Backend::BTree, Backend::Unrolled] {
        for side in [Side::Buy, Side::Sell] {
            let mut book =
                DynOrderBook::with_backend(backend, PriceComparator::default(), &tuning);
            for i in 0..64 {
                book.insert_order(format!("o{i}"), side, i as u64, key(i), 1.0)
                    .unwrap();
            }
            assert_eq!(book.level_count(side), 64);

            let mut removed = 0;
            for k in (0..64).map(|i| (i * 37) % 64) {
                let between = key(k) + 7.5e-9;
                let Some(level) = book.level(side, between) else {
                    continue;
                };
                let emptied = level.price();
                let id = level.front().unwrap().id.clone();
                let before = book.level_count(side);

                let fragment = book.remove_order(id.as_str(), side, between).unwrap();
                removed += 1;

                assert_eq!(fragment.id, id, "{backend} {side}");
                assert_eq!(book.level_count(side), before - 1, "{backend} {side}");
                assert_eq!(book.order_count(side), book.level_count(side));
                assert!(book.level(side, emptied).is_none(), "{backend} {side}");
            }
            assert!(removed >= 32);

            let rest: Vec<_> = book.levels(side).map(|l| l.price()).collect();
            for price in rest {
                let id = book.level(side, price).unwrap().front().unwrap().id.clone();
                book.remove_order(id.as_str(), side, price).unwrap();
            }
            assert!(book.is_empty(), "{backend} {side}");
        }
    }
}

#[test]
fn removing_front_promotes_next() {
    let mut book = OrderBook::new();
    for (seq, id) in ["a", "b", "c"].into_iter().enumerate() {
        book.insert_order(id, Side::Sell, seq as u64, 7.0, 1.0).unwrap();
    }
    book.remove_order("a", Side::Sell, 7.0).unwrap();

    let level = book.level(Side::Sell, 7.0).unwrap();
    assert_eq!(level.front().map(|f| f.id.as_str()), Some("b"));
    assert_eq!(level.total_quantity(), 2.0);
}

#[test]
fn late_sequence_sorts_into_place() {
    let mut book = OrderBook::new();
    book.insert_order("late", Side::Buy, 9, 1.0, 1.0).unwrap();
    book.insert_order("early", Side::Buy, 3, 1.0, 1.0).unwrap();

    let ids: Vec<&str> = book
        .level(Side::Buy, 1.0)
        .unwrap()
        .iter()
        .map(|f| f.id.as_str())
        .collect();
    assert_eq!(ids, ["early", "late"]);
}

// ============================================================================
// Tolerance boundaries
// ============================================================================

#[test]
fn prices_beyond_tolerance_are_distinct() {
    let mut book = OrderBook::new();
    book.insert_order("a", Side::Sell, 1, 1.0, 1.0).unwrap();
    book.insert_order("b", Side::Sell, 2, 1.0 + 2e-8, 1.0).unwrap();
    assert_eq!(book.level_count(Side::Sell), 2);
    assert_eq!(book.best_ask(), Some(1.0));
}

#[test]
fn tiny_and_huge_prices() {
    let mut book = OrderBook::new();
    book.insert_order("tiny", Side::Sell, 1, 3e-8, 1.0).unwrap();
    book.insert_order("tinier", Side::Sell, 2, 1e-8, 1.0).unwrap();
    book.insert_order("huge", Side::Buy, 3, 1e12, 1.0).unwrap();

    assert_eq!(book.level_count(Side::Sell), 2);
    assert_eq!(book.best_ask(), Some(1e-8));
    assert!(book.is_crossed());
}

#[test]
fn coarse_precision_merges_levels() {
    let mut book = OrderBook::with_precision(0.01).unwrap();
    book.insert_order("a", Side::Buy, 1, 5.000, 1.0).unwrap();
    book.insert_order("b", Side::Buy, 2, 5.004, 1.0).unwrap();
    book.insert_order("c", Side::Buy, 3, 5.02, 1.0).unwrap();

    assert_eq!(book.level_count(Side::Buy), 2);
    assert_eq!(book.level(Side::Buy, 5.0).unwrap().len(), 2);
}

#[test]
fn touching_prices_cross() {
    let mut book = OrderBook::new();
    book.insert_order("b", Side::Buy, 1, 2.0, 1.0).unwrap();
    book.insert_order("s", Side::Sell, 2, 2.0 + 5e-9, 1.0).unwrap();
    assert!(book.is_crossed());
    assert_eq!(book.overlapped_range().len(), 1);
}

// ============================================================================
// Overlap
// ============================================================================

#[test]
fn auction_example_curve() {
    let curve = auction_book().overlapped_range();

    let rows: Vec<(f64, f64, f64, f64, f64)> = curve
        .iter()
        .map(|l| (l.price, l.buy_total, l.sell_total, l.executions, l.surplus))
        .collect();
    assert_eq!(
        rows,
        vec![
            (10.0, 3.0, 1.0, 1.0, 2.0),
            (10.2, 5.0, 1.0, 1.0, 4.0),
            (10.4, 5.0, 6.0, 5.0, 1.0),
        ]
    );

    let buys: Vec<&str> = curve[2].buy_orders.iter().map(|f| f.id.as_str()).collect();
    let sells: Vec<&str> = curve[2].sell_orders.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(buys, ["b1", "b2"]);
    assert_eq!(sells, ["s1", "s2"]);
}

#[test]
fn overlap_does_not_mutate_book() {
    let book = auction_book();
    let before = book.full_depth();
    let first = book.overlapped_range();
    assert_eq!(book.overlapped_range(), first);
    assert_eq!(book.full_depth(), before);
}

#[test]
fn overlap_after_cancel_uncrosses() {
    let mut book = auction_book();
    book.remove_order("s1", Side::Sell, 10.0).unwrap();
    // 10.2 no longer reaches the best ask.
    let curve = book.overlapped_range();
    assert_eq!(curve.len(), 1);
    assert_eq!((curve[0].price, curve[0].executions), (10.4, 3.0));

    book.remove_order("b1", Side::Buy, 10.5).unwrap();
    assert!(!book.is_crossed());
    assert!(book.overlapped_range().is_empty());
}

#[test]
fn unrolled_book_resolves_example() {
    let mut book = DynOrderBook::with_backend(
        Backend::Unrolled,
        PriceComparator::default(),
        &IndexTuning::default(),
    );
    book.insert_order("b1", Side::Buy, 1, 10.5, 3.0).unwrap();
    book.insert_order("b2", Side::Buy, 2, 10.2, 2.0).unwrap();
    book.insert_order("s1", Side::Sell, 3, 10.0, 1.0).unwrap();
    book.insert_order("s2", Side::Sell, 4, 10.4, 5.0).unwrap();

    assert_eq!(book.overlapped_range(), auction_book().overlapped_range());
}

// ============================================================================
// Clear and registry
// ============================================================================

#[test]
fn clear_then_reuse() {
    let mut book = auction_book();
    book.clear();
    assert!(book.is_empty());
    book.insert_order("b1", Side::Buy, 5, 10.5, 3.0).unwrap();
    assert_eq!(book.best_bid(), Some(10.5));
}

#[test]
fn registry_books_do_not_share_levels() {
    let mut books = Books::new();
    let a = Symbol::new("A_B");
    let c = Symbol::new("C_B");

    books.get_or_create(&a).insert_order("x", Side::Buy, 1, 1.0, 1.0).unwrap();
    assert!(books.get_or_create(&c).is_empty());
    assert!(
        books
            .get_mut(&c)
            .unwrap()
            .remove_order("x", Side::Buy, 1.0)
            .is_err()
    );
}

#[cfg(feature = "config")]
#[test]
fn book_from_config() {
    use callbook::BookConfig;

    let config = BookConfig::from_toml_str(
        "[book]\nbackend = \"unrolled\"\nprecision = 0.5\n\n[unrolled]\nbucket_capacity = 2\n",
    )
    .unwrap();
    let mut book = DynOrderBook::from_config(&config).unwrap();
    for (i, price) in [1.0, 1.2, 2.0, 3.0, 4.0].into_iter().enumerate() {
        book.insert_order(format!("o{i}"), Side::Sell, i as u64, price, 1.0).unwrap();
    }

    assert_eq!(book.level_count(Side::Sell), 4);
    assert_eq!(book.level(Side::Sell, 1.2).unwrap().len(), 2);
}
