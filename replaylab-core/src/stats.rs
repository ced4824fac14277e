//! Summary statistics over the visible prefix.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

/// The statistics block shown next to the chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub current_price: f64,
    /// Percent change within the latest visible bar: `(close - open) / open * 100`.
    pub pct_change: f64,
    pub volume: f64,
}

impl Statistics {
    /// Compute over a visible prefix. Returns defaults for an empty slice
    /// (cannot happen for a live cursor, whose prefix is never empty).
    pub fn compute(visible: &[Bar]) -> Self {
        let Some(last) = visible.last() else {
            return Self::default();
        };
        let pct_change = if last.open != 0.0 {
            (last.close - last.open) / last.open * 100.0
        } else {
            0.0
        };
        Self {
            current_price: last.close,
            pct_change,
            volume: last.volume,
        }
    }
}
