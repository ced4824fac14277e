//! Replay session — the orchestrator tying cursor, ledger, and overlay together.
//!
//! One session owns one loaded series, its cursor, the in-memory trade-marker
//! list, and the overlay configuration. Every user action is an explicit
//! method that mutates state and returns a fresh `RenderPayload`; when the
//! mutation fails nothing downstream is recomputed and the previous render
//! remains valid.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::chart::{
    heikin_ashi, ma_values, ChartKind, MaLine, MovingAverageSpec, RenderPayload, Viewport,
};
use crate::cursor::Cursor;
use crate::domain::{BarSeries, IndicatorSignal, TradeMarker, TradeSide};
use crate::error::ReplayError;
use crate::ledger::{AccountKey, LedgerStore};
use crate::overlay::build_overlay;
use crate::stats::Statistics;

pub struct ReplaySession {
    user_id: i64,
    ledger: Arc<LedgerStore>,
    series: Arc<BarSeries>,
    cursor: Cursor,
    /// Markers for this account key, replayed from the transaction log on
    /// load and appended to on each executed trade. Saves a storage round
    /// trip per render.
    markers: Vec<TradeMarker>,
    signals: Vec<IndicatorSignal>,
    moving_averages: Vec<MovingAverageSpec>,
    chart_kind: ChartKind,
    viewport: Viewport,
    /// False until the first jump: a freshly loaded session shows the whole
    /// series with no cutoff, like a plain chart viewer.
    cutoff_active: bool,
    rng: StdRng,
}

impl ReplaySession {
    /// Open a session over a freshly fetched series. Replays the persisted
    /// transaction log for this `(user, symbol, market)` into trade markers.
    pub fn open(
        ledger: Arc<LedgerStore>,
        series: BarSeries,
        user_id: i64,
        seed: u64,
    ) -> Result<Self, ReplayError> {
        let series = Arc::new(series);
        let key = AccountKey::new(user_id, series.symbol(), series.market());
        let markers = ledger
            .transactions_for(&key)?
            .iter()
            .map(TradeMarker::from)
            .collect();
        let cursor = Cursor::new(series.clone());
        Ok(Self {
            user_id,
            ledger,
            series,
            cursor,
            markers,
            signals: Vec::new(),
            moving_averages: Vec::new(),
            chart_kind: ChartKind::Candles,
            viewport: Viewport::default(),
            cutoff_active: false,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn series(&self) -> &Arc<BarSeries> {
        &self.series
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn markers(&self) -> &[TradeMarker] {
        &self.markers
    }

    pub fn account_key(&self) -> AccountKey {
        AccountKey::new(self.user_id, self.series.symbol(), self.series.market())
    }

    /// Whether a cutoff is limiting the visible prefix.
    pub fn cutoff_active(&self) -> bool {
        self.cutoff_active
    }

    // ── Cursor actions ───────────────────────────────────────────────────

    /// Jump to a random point in the middle band of history.
    pub fn jump_random(&mut self) -> Result<RenderPayload, ReplayError> {
        self.cursor.jump_random(&mut self.rng);
        self.cutoff_active = true;
        Ok(self.render())
    }

    /// Advance the cursor by `n` bars. Rejected whole at the end of history.
    pub fn step(&mut self, n: usize) -> Result<RenderPayload, ReplayError> {
        self.cursor.step(n)?;
        Ok(self.render())
    }

    /// Drop the cutoff and reveal the whole series again.
    pub fn reveal_all(&mut self) -> Result<RenderPayload, ReplayError> {
        self.cursor.reset(self.series.len());
        self.cutoff_active = false;
        Ok(self.render())
    }

    // ── Trade actions ────────────────────────────────────────────────────

    /// Execute a BUY at the current bar's close.
    pub fn buy(&mut self, quantity: f64) -> Result<RenderPayload, ReplayError> {
        if quantity <= 0.0 {
            return Err(ReplayError::InvalidQuantity);
        }
        let price = self.cursor.current_price();
        let timestamp = self.cursor.current_timestamp();
        self.ledger
            .apply_buy(&self.account_key(), quantity, price, timestamp)?;
        self.markers.push(TradeMarker {
            side: TradeSide::Buy,
            timestamp,
            price,
        });
        Ok(self.render())
    }

    /// Execute a SELL at the current bar's close.
    pub fn sell(&mut self, quantity: f64) -> Result<RenderPayload, ReplayError> {
        if quantity <= 0.0 {
            return Err(ReplayError::InvalidQuantity);
        }
        let price = self.cursor.current_price();
        let timestamp = self.cursor.current_timestamp();
        self.ledger
            .apply_sell(&self.account_key(), quantity, price, timestamp)?;
        self.markers.push(TradeMarker {
            side: TradeSide::Sell,
            timestamp,
            price,
        });
        Ok(self.render())
    }

    /// Largest BUY quantity the balance allows at the current price.
    pub fn max_buy_quantity(&self) -> Result<f64, ReplayError> {
        let balance = self.ledger.balance(self.user_id)?;
        let price = self.cursor.current_price();
        if price <= 0.0 {
            return Ok(0.0);
        }
        Ok(balance / price)
    }

    /// Held quantity for this account key, 0 when flat.
    pub fn max_sell_quantity(&self) -> Result<f64, ReplayError> {
        Ok(self
            .ledger
            .position(&self.account_key())?
            .map_or(0.0, |p| p.quantity))
    }

    // ── Overlay configuration ────────────────────────────────────────────

    /// Replace the indicator signal set (recomputed by the caller's signal
    /// source when the user changes indicator or data).
    pub fn set_signals(&mut self, signals: Vec<IndicatorSignal>) -> RenderPayload {
        self.signals = signals;
        self.render()
    }

    pub fn clear_signals(&mut self) -> RenderPayload {
        self.signals.clear();
        self.render()
    }

    pub fn add_moving_average(&mut self, spec: MovingAverageSpec) -> RenderPayload {
        self.moving_averages.push(spec);
        self.render()
    }

    pub fn remove_moving_average(&mut self, index: usize) -> RenderPayload {
        if index < self.moving_averages.len() {
            self.moving_averages.remove(index);
        }
        self.render()
    }

    pub fn moving_averages(&self) -> &[MovingAverageSpec] {
        &self.moving_averages
    }

    pub fn set_chart_kind(&mut self, kind: ChartKind) -> RenderPayload {
        self.chart_kind = kind;
        self.render()
    }

    pub fn chart_kind(&self) -> ChartKind {
        self.chart_kind
    }

    /// Renderer hands its pan/zoom state back so the next render carries it.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    // ── Rendering ────────────────────────────────────────────────────────

    /// Recompute the full render payload from current state.
    pub fn render(&self) -> RenderPayload {
        let visible = self.cursor.visible_bars();
        let cutoff = self
            .cutoff_active
            .then(|| self.cursor.current_timestamp());

        // Snapping happens against the raw visible bars; the Heikin-Ashi
        // transform preserves timestamps so markers stay aligned either way.
        let overlay = build_overlay(&self.markers, &self.signals, cutoff, visible);

        let closes: Vec<f64> = self.series.bars().iter().map(|b| b.close).collect();
        let ma_lines = self
            .moving_averages
            .iter()
            .map(|spec| {
                let mut values = ma_values(&closes, spec.kind, spec.period);
                values.truncate(visible.len());
                MaLine {
                    label: spec.label(),
                    color: spec.color.clone(),
                    values,
                }
            })
            .collect();

        let visible_bars = match self.chart_kind {
            ChartKind::Candles => visible.to_vec(),
            ChartKind::HeikinAshi => heikin_ashi(visible),
        };

        RenderPayload {
            symbol: self.series.symbol().to_string(),
            timeframe: self.series.timeframe(),
            chart_kind: self.chart_kind,
            visible_bars,
            overlay,
            ma_lines,
            statistics: Statistics::compute(visible),
            viewport: self.viewport.clone(),
        }
    }
}
