//! TOML configuration loading and validation.
//!
//! ```toml
//! [book]
//! backend = "unrolled"
//! precision = 1e-8
//!
//! [btree]
//! branching = 32
//!
//! [unrolled]
//! bucket_capacity = 16
//! capacity_hint = 4096
//! ```
//!
//! Every section and field is optional.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::index::{
    Backend, DEFAULT_BRANCHING, DEFAULT_BUCKET_CAPACITY, DEFAULT_CAPACITY_HINT, IndexTuning,
};
use crate::{PRECISION, PriceComparator};

type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BookConfig {
    #[serde(default)]
    pub book: BookSection,
    #[serde(default)]
    pub btree: BTreeSection,
    #[serde(default)]
    pub unrolled: UnrolledSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BookSection {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_precision")]
    pub precision: f64,
}

fn default_precision() -> f64 {
    PRECISION
}

impl Default for BookSection {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            precision: default_precision(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BTreeSection {
    /// Max children per node
    #[serde(default = "default_branching")]
    pub branching: usize,
}

fn default_branching() -> usize {
    DEFAULT_BRANCHING
}

impl Default for BTreeSection {
    fn default() -> Self {
        Self {
            branching: default_branching(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnrolledSection {
    #[serde(default = "default_bucket_capacity")]
    pub bucket_capacity: usize,
    #[serde(default = "default_capacity_hint")]
    pub capacity_hint: usize,
}

fn default_bucket_capacity() -> usize {
    DEFAULT_BUCKET_CAPACITY
}
fn default_capacity_hint() -> usize {
    DEFAULT_CAPACITY_HINT
}

impl Default for UnrolledSection {
    fn default() -> Self {
        Self {
            bucket_capacity: default_bucket_capacity(),
            capacity_hint: default_capacity_hint(),
        }
    }
}

impl BookConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: BookConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    pub fn validate(&self) -> Result<()> {
        if !self.book.precision.is_finite() || self.book.precision <= 0.0 {
            return Err(ConfigError::Invalid(
                "precision must be finite and > 0".into(),
            ));
        }
        if self.btree.branching < 4 || self.btree.branching % 2 != 0 {
            return Err(ConfigError::Invalid(
                "branching must be an even number >= 4".into(),
            ));
        }
        if self.unrolled.bucket_capacity < 2 {
            return Err(ConfigError::Invalid(
                "bucket_capacity must be >= 2".into(),
            ));
        }
        Ok(())
    }

    /// Comparator for the configured precision.
    pub fn comparator(&self) -> crate::Result<PriceComparator> {
        PriceComparator::new(self.book.precision)
    }

    /// Backend tuning knobs.
    pub fn tuning(&self) -> IndexTuning {
        IndexTuning {
            branching: self.btree.branching,
            bucket_capacity: self.unrolled.bucket_capacity,
            capacity_hint: self.unrolled.capacity_hint,
        }
    }
}
