//! Market data: the source trait, CSV exports, and synthetic generators.

pub mod csv;
pub mod provider;
pub mod synthetic;

pub use self::csv::{read_bars, write_bars, CsvSource};
pub use provider::{BarRequest, DataError, DataSource, MarketDataSource};
pub use synthetic::{SyntheticShape, SyntheticSource};
