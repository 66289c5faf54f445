//! Per-symbol registry: one independent book per traded pair.

use rustc_hash::FxHashMap;

use crate::index::{Backend, IndexTuning};
use crate::{DynOrderBook, Price, PriceComparator, Symbol};

/// A collection of per-symbol books sharing one backend choice.
///
/// Books never interact; the registry only routes to the right one.
///
/// ```
/// use callbook::{Books, Side, Symbol};
///
/// let mut books = Books::new();
/// let bnb = Symbol::new("BNB_BTC");
/// let eth = Symbol::new("ETH_BTC");
///
/// books.get_or_create(&bnb).insert_order("o1", Side::Sell, 1, 0.0021, 5.0).unwrap();
/// books.get_or_create(&eth).insert_order("o2", Side::Sell, 2, 0.054, 1.0).unwrap();
///
/// assert_eq!(books.get(&bnb).unwrap().best_ask(), Some(0.0021));
/// assert_eq!(books.get(&eth).unwrap().best_ask(), Some(0.054));
/// ```
#[derive(Debug)]
pub struct Books {
    books: FxHashMap<Symbol, DynOrderBook>,
    backend: Backend,
    comparator: PriceComparator,
    tuning: IndexTuning,
}

impl Books {
    /// Registry of B-tree books with the default precision.
    pub fn new() -> Self {
        Self::with_backend(
            Backend::default(),
            PriceComparator::default(),
            IndexTuning::default(),
        )
    }

    /// Registry whose new books use the given backend.
    pub fn with_backend(backend: Backend, comparator: PriceComparator, tuning: IndexTuning) -> Self {
        Self {
            books: FxHashMap::default(),
            backend,
            comparator,
            tuning,
        }
    }

    /// Registry whose new books follow a loaded config.
    #[cfg(feature = "config")]
    pub fn from_config(config: &crate::BookConfig) -> crate::Result<Self> {
        Ok(Self::with_backend(
            config.book.backend,
            config.comparator()?,
            config.tuning(),
        ))
    }

    /// Get or create the book for a symbol.
    pub fn get_or_create(&mut self, symbol: &Symbol) -> &mut DynOrderBook {
        let (backend, comparator, tuning) = (self.backend, self.comparator, self.tuning);
        self.books.entry(symbol.clone()).or_insert_with(|| {
            log::debug!("opening {backend} book for {symbol}");
            DynOrderBook::with_backend(backend, comparator, &tuning)
        })
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&DynOrderBook> {
        self.books.get(symbol)
    }

    pub fn get_mut(&mut self, symbol: &Symbol) -> Option<&mut DynOrderBook> {
        self.books.get_mut(symbol)
    }

    /// Drop a symbol's book, returning it.
    pub fn remove(&mut self, symbol: &Symbol) -> Option<DynOrderBook> {
        self.books.remove(symbol)
    }

    /// Iterator over all symbols that have books.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.books.keys()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Best bid and ask for every symbol.
    pub fn best_prices(&self) -> Vec<(Symbol, Option<Price>, Option<Price>)> {
        self.books
            .iter()
            .map(|(symbol, book)| (symbol.clone(), book.best_bid(), book.best_ask()))
            .collect()
    }
}

impl Default for Books {
    fn default() -> Self {
        Self::new()
    }
}
