//! Cursor — how much of history the user is allowed to see.
//!
//! A cursor tracks the visible prefix of a bar series: `visible_count` bars
//! are revealed, the "current" bar is the last of them. Transitions are
//! `reset`, `jump_random`, and `step`; the cursor lives as long as its series
//! and is discarded when a new series is loaded.

use std::sync::Arc;

use chrono::NaiveDateTime;
use rand::Rng;

use crate::domain::{Bar, BarSeries};
use crate::error::ReplayError;

#[derive(Debug, Clone)]
pub struct Cursor {
    series: Arc<BarSeries>,
    visible: usize,
}

impl Cursor {
    /// New cursor revealing the full series.
    pub fn new(series: Arc<BarSeries>) -> Self {
        let visible = series.len();
        Self { series, visible }
    }

    pub fn series(&self) -> &Arc<BarSeries> {
        &self.series
    }

    /// Number of revealed bars, always in `[1, len]`.
    pub fn visible_count(&self) -> usize {
        self.visible
    }

    /// The revealed prefix.
    pub fn visible_bars(&self) -> &[Bar] {
        &self.series.bars()[..self.visible]
    }

    /// Set the prefix length directly, clamped into `[1, len]`.
    pub fn reset(&mut self, visible: usize) {
        self.visible = visible.clamp(1, self.series.len());
    }

    /// Jump to a uniformly random point in `[floor(0.2·len), ceil(0.8·len))`.
    ///
    /// The band keeps the cursor away from the edges of history, where
    /// indicators and statistics would be degenerate. Returns the chosen
    /// prefix length.
    pub fn jump_random<R: Rng>(&mut self, rng: &mut R) -> usize {
        let len = self.series.len();
        let lo = ((len as f64) * 0.2).floor() as usize;
        let hi = ((len as f64) * 0.8).ceil() as usize;
        // Degenerate short series: keep the range valid and within [1, len].
        let lo = lo.max(1);
        let hi = hi.max(lo + 1).min(len + 1);
        self.visible = rng.gen_range(lo..hi);
        self.visible
    }

    /// Advance by `n` bars. Rejected whole — no partial advance, no clamping —
    /// when the result would exceed the series length.
    pub fn step(&mut self, n: usize) -> Result<usize, ReplayError> {
        let requested = self.visible.checked_add(n).unwrap_or(usize::MAX);
        if requested > self.series.len() {
            return Err(ReplayError::CursorOutOfRange {
                requested,
                len: self.series.len(),
            });
        }
        self.visible = requested;
        Ok(self.visible)
    }

    pub fn current_bar(&self) -> &Bar {
        &self.series.bars()[self.visible - 1]
    }

    /// Close of the current bar.
    pub fn current_price(&self) -> f64 {
        self.current_bar().close
    }

    pub fn current_timestamp(&self) -> NaiveDateTime {
        self.current_bar().timestamp
    }
}
