//! Error types for book operations and configuration.

use crate::{OrderId, Price, Quantity, Side};

/// Errors returned by order book and price level operations.
///
/// A failed operation leaves the book exactly as it was.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum BookError {
    /// The id already rests at this price level.
    #[error("order {id} already rests at price {price}")]
    DuplicateOrder { id: OrderId, price: Price },

    /// The id does not rest at this price level.
    #[error("order {id} does not rest at price {price}")]
    OrderNotFound { id: OrderId, price: Price },

    /// No level exists at this side and price.
    #[error("no {side} price level at {price}")]
    PriceLevelNotFound { side: Side, price: Price },

    /// The index did not hold the level after an upsert. Indicates an index
    /// bug, not a caller error.
    #[error("failed to insert order {id} at {side} price {price}")]
    InsertFailed { id: OrderId, side: Side, price: Price },

    /// Price must be finite and greater than zero.
    #[error("invalid price {0}: must be finite and greater than zero")]
    InvalidPrice(Price),

    /// Quantity must be finite and not negative.
    #[error("invalid quantity {0}: must be finite and not negative")]
    InvalidQuantity(Quantity),

    /// Precision must be finite and greater than zero.
    #[error("invalid precision {0}: must be finite and greater than zero")]
    InvalidPrecision(f64),
}

pub type Result<T> = std::result::Result<T, BookError>;

/// Errors raised while loading a [`BookConfig`](crate::BookConfig).
#[cfg(feature = "config")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Invalid(String),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
