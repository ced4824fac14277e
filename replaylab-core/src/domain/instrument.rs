//! Markets and timeframes.

use serde::{Deserialize, Serialize};

/// Supported markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    Bist,
    Forex,
    Crypto,
    Nasdaq,
}

impl Market {
    pub const ALL: [Market; 4] = [Market::Bist, Market::Forex, Market::Crypto, Market::Nasdaq];

    pub fn label(self) -> &'static str {
        match self {
            Market::Bist => "BIST",
            Market::Forex => "Forex",
            Market::Crypto => "Crypto",
            Market::Nasdaq => "NASDAQ",
        }
    }

    /// Exchange code used by data providers.
    pub fn exchange_code(self) -> &'static str {
        match self {
            Market::Bist => "BIST",
            Market::Forex => "FX",
            Market::Crypto => "BINANCE",
            Market::Nasdaq => "NASDAQ",
        }
    }

    /// Prefix a bare symbol with its exchange, e.g. `BINANCE:BTCUSDT`.
    pub fn full_symbol(self, symbol: &str) -> String {
        format!("{}:{}", self.exchange_code(), symbol)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Market::ALL.into_iter().find(|m| m.label() == label)
    }
}

/// Bar interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
    W1,
    Mo1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 9] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
        Timeframe::Mo1,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
            Timeframe::Mo1 => "1M",
        }
    }

    /// Nominal seconds per bar (months approximated as 30 days).
    pub fn seconds(self) -> u64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M5 => 300,
            Timeframe::M15 => 900,
            Timeframe::M30 => 1800,
            Timeframe::H1 => 3600,
            Timeframe::H4 => 14_400,
            Timeframe::D1 => 86_400,
            Timeframe::W1 => 604_800,
            Timeframe::Mo1 => 2_592_000,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Timeframe::ALL.into_iter().find(|t| t.label() == label)
    }
}
