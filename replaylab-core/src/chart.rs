//! Chart payload building: candle transforms, moving-average lines, viewport.
//!
//! The core never draws anything. It assembles a `RenderPayload` — visible
//! bars, snapped overlay, MA lines, statistics — and threads the renderer's
//! pan/zoom viewport through unchanged so a data update never resets the
//! user's view position.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Timeframe};
use crate::overlay::OverlayView;
use crate::stats::Statistics;

/// Candle rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Candles,
    HeikinAshi,
}

impl ChartKind {
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Candles => "Candles",
            ChartKind::HeikinAshi => "Heikin-Ashi",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            ChartKind::Candles => ChartKind::HeikinAshi,
            ChartKind::HeikinAshi => ChartKind::Candles,
        }
    }
}

/// Heikin-Ashi transform of a bar slice.
///
/// ha_close = (o + h + l + c) / 4;
/// ha_open  = (prev_ha_open + prev_ha_close) / 2, seeded with (o + c) / 2;
/// ha_high/low = extremes of (high, ha_open, ha_close) / (low, ha_open, ha_close).
/// Timestamps and volume pass through untouched.
pub fn heikin_ashi(bars: &[Bar]) -> Vec<Bar> {
    let mut out = Vec::with_capacity(bars.len());
    let mut prev_open = 0.0;
    let mut prev_close = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let ha_close = (bar.open + bar.high + bar.low + bar.close) / 4.0;
        let ha_open = if i == 0 {
            (bar.open + bar.close) / 2.0
        } else {
            (prev_open + prev_close) / 2.0
        };
        let ha_high = bar.high.max(ha_open).max(ha_close);
        let ha_low = bar.low.min(ha_open).min(ha_close);

        out.push(Bar {
            timestamp: bar.timestamp,
            open: ha_open,
            high: ha_high,
            low: ha_low,
            close: ha_close,
            volume: bar.volume,
        });
        prev_open = ha_open;
        prev_close = ha_close;
    }
    out
}

/// Moving-average flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaKind {
    Sma,
    Ema,
}

impl MaKind {
    pub fn label(self) -> &'static str {
        match self {
            MaKind::Sma => "SMA",
            MaKind::Ema => "EMA",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            MaKind::Sma => MaKind::Ema,
            MaKind::Ema => MaKind::Sma,
        }
    }
}

/// A user-configured moving-average overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovingAverageSpec {
    pub kind: MaKind,
    pub period: usize,
    /// Renderer color hint, e.g. "#ff0000".
    pub color: String,
}

impl MovingAverageSpec {
    pub fn label(&self) -> String {
        format!("{}-{}", self.kind.label(), self.period)
    }
}

/// One computed MA line, truncated to the visible prefix. Values before the
/// warmup window are NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaLine {
    pub label: String,
    pub color: String,
    pub values: Vec<f64>,
}

/// Compute MA values over a close series. NaN until `period - 1`.
///
/// EMA is seeded with the SMA of the first `period` values, then recursed with
/// `alpha = 2 / (period + 1)`.
pub fn ma_values(closes: &[f64], kind: MaKind, period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let seed: f64 = closes.iter().take(period).sum::<f64>() / period as f64;
    result[period - 1] = seed;

    match kind {
        MaKind::Sma => {
            let mut sum = seed * period as f64;
            for i in period..n {
                sum = sum - closes[i - period] + closes[i];
                result[i] = sum / period as f64;
            }
        }
        MaKind::Ema => {
            let alpha = 2.0 / (period as f64 + 1.0);
            let mut prev = seed;
            for i in period..n {
                let ema = alpha * closes[i] + (1.0 - alpha) * prev;
                result[i] = ema;
                prev = ema;
            }
        }
    }
    result
}

/// Presentational pan/zoom state, owned by the renderer and passed back
/// unchanged on every recompute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
}

/// Everything a renderer needs after a state-changing action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderPayload {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub chart_kind: ChartKind,
    /// Visible prefix, already transformed when `chart_kind` is Heikin-Ashi.
    pub visible_bars: Vec<Bar>,
    pub overlay: OverlayView,
    pub ma_lines: Vec<MaLine>,
    pub statistics: Statistics,
    pub viewport: Viewport,
}
