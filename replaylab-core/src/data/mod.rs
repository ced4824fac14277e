//! Data providers — where bar series come from.
//!
//! Fetching is an external concern: the engine consumes a finished,
//! time-ordered OHLCV table. The `BarProvider` trait abstracts over sources
//! (CSV files on disk, deterministic synthetic data for demos and tests) so
//! the front-ends can swap implementations.

mod csv_files;
mod synthetic;

pub use csv_files::CsvBarProvider;
pub use synthetic::SyntheticProvider;

use crate::domain::{BarSeries, Market, Timeframe};
use crate::error::ReplayError;

/// A source of bar series and symbol universes.
pub trait BarProvider {
    /// Fetch the full series for one selection. An empty result surfaces as
    /// `DataUnavailable` — no trading actions are permitted without data.
    fn fetch_bars(
        &self,
        symbol: &str,
        market: Market,
        timeframe: Timeframe,
    ) -> Result<BarSeries, ReplayError>;

    /// Symbols available for a market, sorted.
    fn list_symbols(&self, market: Market) -> Result<Vec<String>, ReplayError>;
}
