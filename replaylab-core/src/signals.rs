//! Signal sources — pluggable producers of indicator signals.
//!
//! The replay engine only consumes `(timestamp, price, kind)` records; where
//! they come from is behind the `SignalSource` trait. One built-in source is
//! provided: a moving-average crossover (golden/death cross).

use crate::chart::{ma_values, MaKind};
use crate::domain::{BarSeries, IndicatorSignal, SignalKind};

/// A producer of indicator signals for a loaded series.
///
/// Called on demand when the user selects an indicator or loads new data;
/// the session stores the output and filters it against the cutoff.
pub trait SignalSource {
    fn name(&self) -> &str;
    fn compute(&self, series: &BarSeries) -> Vec<IndicatorSignal>;
}

/// Moving-average crossover source.
///
/// Emits a Buy signal on the bar where the fast MA crosses above the slow MA
/// and a Sell signal where it crosses below. Signal price is the bar close.
#[derive(Debug, Clone)]
pub struct MaCrossSignals {
    pub fast_period: usize,
    pub slow_period: usize,
    pub kind: MaKind,
    name: String,
}

impl MaCrossSignals {
    pub fn new(fast_period: usize, slow_period: usize, kind: MaKind) -> Self {
        assert!(fast_period >= 1, "fast_period must be >= 1");
        assert!(
            slow_period > fast_period,
            "slow_period must be > fast_period"
        );
        let name = format!(
            "{}-cross-{}/{}",
            kind.label().to_lowercase(),
            fast_period,
            slow_period
        );
        Self {
            fast_period,
            slow_period,
            kind,
            name,
        }
    }

    pub fn default_params() -> Self {
        Self::new(10, 50, MaKind::Sma)
    }
}

impl SignalSource for MaCrossSignals {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, series: &BarSeries) -> Vec<IndicatorSignal> {
        let closes: Vec<f64> = series.bars().iter().map(|b| b.close).collect();
        let fast = ma_values(&closes, self.kind, self.fast_period);
        let slow = ma_values(&closes, self.kind, self.slow_period);

        let mut out = Vec::new();
        for i in 1..closes.len() {
            let (fc, sc, fp, sp) = (fast[i], slow[i], fast[i - 1], slow[i - 1]);
            if fc.is_nan() || sc.is_nan() || fp.is_nan() || sp.is_nan() {
                continue;
            }
            let kind = if fp <= sp && fc > sc {
                Some(SignalKind::Buy)
            } else if fp >= sp && fc < sc {
                Some(SignalKind::Sell)
            } else {
                None
            };
            if let Some(kind) = kind {
                let bar = &series.bars()[i];
                out.push(IndicatorSignal {
                    timestamp: bar.timestamp,
                    price: bar.close,
                    kind,
                    indicator: self.name.clone(),
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, Market, Timeframe};
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> BarSeries {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1.0,
            })
            .collect();
        BarSeries::new("TEST", Market::Nasdaq, Timeframe::D1, bars).unwrap()
    }

    #[test]
    fn golden_cross_emits_buy() {
        // Downtrend then sharp recovery: fast MA crosses up through slow.
        let closes = [
            20.0, 19.0, 18.0, 17.0, 16.0, 15.0, 14.0, 13.0, 20.0, 28.0, 36.0, 44.0,
        ];
        let source = MaCrossSignals::new(2, 4, MaKind::Sma);
        let signals = source.compute(&series(&closes));
        assert!(!signals.is_empty());
        assert_eq!(signals[0].kind, SignalKind::Buy);
        assert_eq!(signals[0].indicator, "sma-cross-2/4");
    }

    #[test]
    fn death_cross_emits_sell() {
        let closes = [
            10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 10.0, 4.0, 2.0, 1.0,
        ];
        let source = MaCrossSignals::new(2, 4, MaKind::Sma);
        let signals = source.compute(&series(&closes));
        assert!(signals.iter().any(|s| s.kind == SignalKind::Sell));
    }

    #[test]
    fn flat_series_emits_nothing() {
        let closes = [10.0; 20];
        let source = MaCrossSignals::new(3, 6, MaKind::Ema);
        assert!(source.compute(&series(&closes)).is_empty());
    }

    #[test]
    fn signals_sit_on_bar_timestamps() {
        let closes = [
            20.0, 19.0, 18.0, 17.0, 16.0, 15.0, 14.0, 13.0, 20.0, 28.0, 36.0, 44.0,
        ];
        let s = series(&closes);
        let source = MaCrossSignals::new(2, 4, MaKind::Sma);
        for signal in source.compute(&s) {
            assert!(s.bars().iter().any(|b| b.timestamp == signal.timestamp));
        }
    }
}
