//! Market-data source trait and structured error types.
//!
//! The trading terminal, a CSV export, or a synthetic generator all sit behind
//! `MarketDataSource`. The search layer only ever sees an ordered `Vec<PriceBar>`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PriceBar;

/// What to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarRequest {
    pub symbol: String,
    /// Keep only the most recent `count` bars.
    pub count: Option<usize>,
}

impl BarRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            count: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{0}' (expected time, open, high, low, close)")]
    MissingColumn(&'static str),

    #[error("row {row}: cannot parse {field} from '{value}'")]
    Parse {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no bars returned for '{symbol}'")]
    Empty { symbol: String },
}

/// Where the bars came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Csv,
    Synthetic,
}

pub trait MarketDataSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    fn kind(&self) -> DataSource;

    /// Fetch bars oldest-first. An empty result is `DataError::Empty`.
    fn fetch(&self, request: &BarRequest) -> Result<Vec<PriceBar>, DataError>;
}

/// Keep the last `count` bars when a count is requested.
pub(crate) fn apply_count(mut bars: Vec<PriceBar>, count: Option<usize>) -> Vec<PriceBar> {
    if let Some(count) = count {
        if bars.len() > count {
            bars.drain(..bars.len() - count);
        }
    }
    bars
}
