//! Trade records: transaction log entries and chart markers.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::Market;

/// BUY or SELL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn label(self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "BUY" => Some(TradeSide::Buy),
            "SELL" => Some(TradeSide::Sell),
            _ => None,
        }
    }
}

/// Immutable, append-only transaction record.
///
/// `executed_at` is the wall clock at execution; `chart_timestamp` is the bar
/// timestamp the trade was simulated at. The log for a `(user, symbol, market)`
/// key, ordered by `chart_timestamp`, is replayed into trade markers when a
/// series is reloaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub symbol: String,
    pub market: Market,
    pub side: TradeSide,
    pub quantity: f64,
    pub price: f64,
    pub total_amount: f64,
    /// Zero for BUY; `(price - avg_price_before_sell) * quantity` for SELL.
    pub profit_loss: f64,
    pub executed_at: NaiveDateTime,
    pub chart_timestamp: NaiveDateTime,
}

/// An executed trade as plotted on the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeMarker {
    pub side: TradeSide,
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

impl From<&Transaction> for TradeMarker {
    fn from(txn: &Transaction) -> Self {
        Self {
            side: txn.side,
            timestamp: txn.chart_timestamp,
            price: txn.price,
        }
    }
}
