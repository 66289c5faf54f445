//! # callbook
//!
//! A per-symbol order book for call-auction exchanges, with tolerance-aware
//! floating-point prices.
//!
//! ## Features
//!
//! - **Tolerance-aware prices**: prices closer than the precision (`1e-8` by
//!   default) are one price level
//! - **Time priority**: fragments at a level queue in sequence order
//! - **Pluggable indices**: a B-tree or an unrolled list behind one
//!   [`PriceIndex`] trait
//! - **Auction overlap**: resolve a crossed book into a cumulative curve
//! - **Deterministic replay**: every mutation is recorded as an event
//!
//! ## Quick Start
//!
//! ```
//! use callbook::{OrderBook, Side};
//!
//! let mut book = OrderBook::new();
//!
//! // Orders rest without matching, even when they cross.
//! book.insert_order("b1", Side::Buy, 1, 10.5, 3.0)?;
//! book.insert_order("b2", Side::Buy, 2, 10.2, 2.0)?;
//! book.insert_order("s1", Side::Sell, 3, 10.0, 1.0)?;
//! book.insert_order("s2", Side::Sell, 4, 10.4, 5.0)?;
//!
//! assert!(book.is_crossed());
//! assert_eq!(book.best_bid(), Some(10.5));
//! assert_eq!(book.best_ask(), Some(10.0));
//! # Ok::<(), callbook::BookError>(())
//! ```
//!
//! ## Price Tolerance
//!
//! Prices come out of ratio arithmetic, so `0.1 + 0.2` must land on the
//! same level as `0.3`:
//!
//! ```
//! use callbook::{OrderBook, Side};
//!
//! let mut book = OrderBook::new();
//! book.insert_order("a", Side::Sell, 1, 0.3, 1.0)?;
//! let level = book.insert_order("b", Side::Sell, 2, 0.1 + 0.2, 1.0)?;
//!
//! assert_eq!(level.len(), 2);
//! assert_eq!(level.price(), 0.3);
//! # Ok::<(), callbook::BookError>(())
//! ```
//!
//! ## Overlap Resolution
//!
//! ```
//! use callbook::{OrderBook, Side};
//!
//! let mut book = OrderBook::new();
//! book.insert_order("b1", Side::Buy, 1, 10.5, 3.0)?;
//! book.insert_order("b2", Side::Buy, 2, 10.2, 2.0)?;
//! book.insert_order("s1", Side::Sell, 3, 10.0, 1.0)?;
//! book.insert_order("s2", Side::Sell, 4, 10.4, 5.0)?;
//!
//! let curve = book.overlapped_range();
//! let prices: Vec<f64> = curve.iter().map(|l| l.price).collect();
//! assert_eq!(prices, vec![10.0, 10.2, 10.4]);
//! assert_eq!(curve[2].executions, 5.0);
//! assert_eq!(curve[2].surplus, 1.0);
//! # Ok::<(), callbook::BookError>(())
//! ```
//!
//! Picking the clearing price (say, most executions, then least surplus)
//! is left to the caller.
//!
//! ## Choosing a Backend
//!
//! ```
//! use callbook::{Backend, DynOrderBook, IndexTuning, PriceComparator, Side};
//!
//! let mut book = DynOrderBook::with_backend(
//!     Backend::Unrolled,
//!     PriceComparator::default(),
//!     &IndexTuning::default(),
//! );
//! book.insert_order("a", Side::Buy, 1, 2.5, 1.0)?;
//! assert_eq!(book.best_bid(), Some(2.5));
//! # Ok::<(), callbook::BookError>(())
//! ```
//!
//! ## Logging
//!
//! The library logs through the [`log`](https://docs.rs/log) facade only:
//! level creation and deletion at `debug`, order churn at `trace`. Nothing is
//! printed unless the application installs a logger.

mod book;
mod comparator;
#[cfg(feature = "config")]
pub mod config;
mod error;
mod event;
pub mod index;
mod level;
pub mod multi_book;
mod overlap;
#[cfg(feature = "persistence")]
pub mod persistence;
mod side;
mod snapshot;
mod types;

// Re-export public API
pub use book::{DynOrderBook, OrderBook};
pub use comparator::{PRECISION, PriceComparator};
#[cfg(feature = "config")]
pub use config::BookConfig;
#[cfg(feature = "config")]
pub use error::ConfigError;
pub use error::{BookError, Result};
pub use event::Event;
pub use index::{Backend, IndexTuning, PriceIndex, TreeIndex, UnrolledIndex};
pub use level::{OrderFragment, PriceLevel};
pub use multi_book::Books;
pub use overlap::OverlappedLevel;
pub use side::Side;
pub use snapshot::{BookSnapshot, LevelSnapshot};
pub use types::{OrderId, Price, Quantity, Sequence, Symbol};
