//! Indicator signals — external input the core overlays, never computes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Direction an indicator flags at a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    Buy,
    Sell,
}

impl SignalKind {
    pub fn label(self) -> &'static str {
        match self {
            SignalKind::Buy => "BUY",
            SignalKind::Sell => "SELL",
        }
    }
}

/// One indicator signal point, treated as read-only by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSignal {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub kind: SignalKind,
    pub indicator: String,
}
