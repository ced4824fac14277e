//! Deterministic synthetic bars for demos and offline use.
//!
//! A seeded random walk: the same `(seed, symbol, market, timeframe)`
//! selection always reproduces the same series, so replay sessions are
//! stable across restarts without any network or disk dependency.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::BarProvider;
use crate::domain::{Bar, BarSeries, Market, Timeframe};
use crate::error::ReplayError;

pub struct SyntheticProvider {
    seed: u64,
    bar_count: usize,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            bar_count: 500,
        }
    }

    pub fn with_bar_count(seed: u64, bar_count: usize) -> Self {
        Self { seed, bar_count }
    }

    fn sub_seed(&self, symbol: &str, market: Market, timeframe: Timeframe) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        symbol.hash(&mut hasher);
        market.label().hash(&mut hasher);
        timeframe.label().hash(&mut hasher);
        hasher.finish()
    }
}

impl BarProvider for SyntheticProvider {
    fn fetch_bars(
        &self,
        symbol: &str,
        market: Market,
        timeframe: Timeframe,
    ) -> Result<BarSeries, ReplayError> {
        let mut rng = StdRng::seed_from_u64(self.sub_seed(symbol, market, timeframe));
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .expect("valid date")
            .and_hms_opt(0, 0, 0)
            .expect("valid time");
        let step = chrono::Duration::seconds(timeframe.seconds() as i64);

        // Log-normal-ish walk with mild drift; intrabar range from the same RNG.
        let mut price: f64 = 50.0 + rng.gen_range(0.0..150.0);
        let mut bars = Vec::with_capacity(self.bar_count);
        for i in 0..self.bar_count {
            let ret = rng.gen_range(-0.02..0.021);
            let open = price;
            let close = (price * (1.0 + ret)).max(0.01);
            let span = price * rng.gen_range(0.001..0.015);
            let high = open.max(close) + span;
            let low = (open.min(close) - span).max(0.01);
            let volume = rng.gen_range(1_000.0..100_000.0_f64).round();

            bars.push(Bar {
                timestamp: base + step * i as i32,
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
        }
        BarSeries::new(symbol, market, timeframe, bars)
    }

    fn list_symbols(&self, market: Market) -> Result<Vec<String>, ReplayError> {
        let symbols = match market {
            Market::Bist => ["ASELS", "GARAN", "KCHOL", "SISE", "THYAO", "TUPRS"],
            Market::Forex => ["AUDUSD", "EURUSD", "GBPUSD", "USDCHF", "USDJPY", "USDTRY"],
            Market::Crypto => ["ADAUSDT", "BNBUSDT", "BTCUSDT", "ETHUSDT", "SOLUSDT", "XRPUSDT"],
            Market::Nasdaq => ["AAPL", "AMZN", "GOOGL", "MSFT", "NVDA", "TSLA"],
        };
        Ok(symbols.iter().map(|s| s.to_string()).collect())
    }
}
