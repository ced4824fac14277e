//! Bar and BarSeries — the immutable market-data substrate.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Market, Timeframe};
use crate::error::ReplayError;

/// OHLCV bar for a single symbol over one timeframe interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Basic OHLCV sanity check: high >= low, high bounds open/close, prices positive.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// Time-ordered, immutable bar table for one `(symbol, market, timeframe)` triple.
///
/// Owned by the session that loaded it; replaced wholesale on symbol or
/// timeframe change. Construction validates non-emptiness and strictly
/// ascending timestamps — a series that exists is always safe to index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarSeries {
    symbol: String,
    market: Market,
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(
        symbol: impl Into<String>,
        market: Market,
        timeframe: Timeframe,
        bars: Vec<Bar>,
    ) -> Result<Self, ReplayError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(ReplayError::DataUnavailable { symbol });
        }
        for pair in bars.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(ReplayError::InvalidSeries(format!(
                    "timestamps not strictly ascending at {}",
                    pair[1].timestamp
                )));
            }
        }
        Ok(Self {
            symbol,
            market,
            timeframe,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn market(&self) -> Market {
        self.market
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false: an empty series cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bar(&self, i: usize) -> Option<&Bar> {
        self.bars.get(i)
    }

    pub fn timestamp_of(&self, i: usize) -> Option<NaiveDateTime> {
        self.bars.get(i).map(|b| b.timestamp)
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn last(&self) -> &Bar {
        // Invariant: non-empty after construction.
        &self.bars[self.bars.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, minute, 0)
            .unwrap()
    }

    fn bar(minute: u32, close: f64) -> Bar {
        Bar {
            timestamp: ts(minute),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn series_rejects_empty() {
        let err = BarSeries::new("THYAO", Market::Bist, Timeframe::H1, vec![]).unwrap_err();
        assert!(matches!(err, ReplayError::DataUnavailable { .. }));
    }

    #[test]
    fn series_rejects_unordered_timestamps() {
        let bars = vec![bar(5, 10.0), bar(3, 11.0)];
        let err = BarSeries::new("THYAO", Market::Bist, Timeframe::H1, bars).unwrap_err();
        assert!(matches!(err, ReplayError::InvalidSeries(_)));
    }

    #[test]
    fn series_rejects_duplicate_timestamps() {
        let bars = vec![bar(5, 10.0), bar(5, 11.0)];
        assert!(BarSeries::new("THYAO", Market::Bist, Timeframe::H1, bars).is_err());
    }

    #[test]
    fn series_indexed_access() {
        let bars = vec![bar(1, 10.0), bar(2, 11.0), bar(3, 12.0)];
        let series = BarSeries::new("BTCUSDT", Market::Crypto, Timeframe::M1, bars).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.bar(1).unwrap().close, 11.0);
        assert_eq!(series.timestamp_of(2).unwrap(), ts(3));
        assert!(series.bar(3).is_none());
        assert_eq!(series.last().close, 12.0);
    }

    #[test]
    fn bar_sanity() {
        assert!(bar(0, 10.0).is_sane());
        let mut bad = bar(0, 10.0);
        bad.high = bad.low - 1.0;
        assert!(!bad.is_sane());
    }
}
