//! CSV-backed bar provider.
//!
//! Layout: `<root>/<market label>/<SYMBOL>_<timeframe>.csv` with the header
//! `timestamp,open,high,low,close,volume`. Timestamps accept either
//! `YYYY-MM-DD HH:MM:SS` or the ISO `T` separator.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::data::BarProvider;
use crate::domain::{Bar, BarSeries, Market, Timeframe};
use crate::error::ReplayError;

pub struct CsvBarProvider {
    root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, ReplayError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| ReplayError::InvalidSeries(format!("bad timestamp '{raw}': {e}")))
}

impl CsvBarProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn series_path(&self, symbol: &str, market: Market, timeframe: Timeframe) -> PathBuf {
        self.root
            .join(market.label())
            .join(format!("{symbol}_{}.csv", timeframe.label()))
    }

    fn read_rows(path: &Path) -> Result<Vec<Bar>, ReplayError> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| ReplayError::Storage(format!("{}: {e}", path.display())))?;
        let mut bars = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(|e| ReplayError::InvalidSeries(e.to_string()))?;
            bars.push(Bar {
                timestamp: parse_timestamp(&row.timestamp)?,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }
        Ok(bars)
    }
}

impl BarProvider for CsvBarProvider {
    fn fetch_bars(
        &self,
        symbol: &str,
        market: Market,
        timeframe: Timeframe,
    ) -> Result<BarSeries, ReplayError> {
        let path = self.series_path(symbol, market, timeframe);
        if !path.exists() {
            return Err(ReplayError::DataUnavailable {
                symbol: symbol.to_string(),
            });
        }
        let bars = Self::read_rows(&path)?;
        BarSeries::new(symbol, market, timeframe, bars)
    }

    fn list_symbols(&self, market: Market) -> Result<Vec<String>, ReplayError> {
        let dir = self.root.join(market.label());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| ReplayError::Storage(format!("{}: {e}", dir.display())))?;
        let mut symbols: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ReplayError::Storage(e.to_string()))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(stem) = name.strip_suffix(".csv") else {
                continue;
            };
            if let Some((symbol, _tf)) = stem.rsplit_once('_') {
                if !symbols.iter().any(|s| s == symbol) {
                    symbols.push(symbol.to_string());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}
