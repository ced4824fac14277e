//! Application state — single-owner, main-thread only.
//!
//! Everything the TUI shows lives here: the loaded replay session, its last
//! render payload, the current market/timeframe/symbol selection, and the
//! transient input state for quantity and balance entry.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use replaylab_core::chart::{ChartKind, MaKind, MovingAverageSpec, RenderPayload};
use replaylab_core::data::BarProvider;
use replaylab_core::domain::{Market, Position, Timeframe, TradeSide, Transaction};
use replaylab_core::ledger::LedgerStore;
use replaylab_core::session::ReplaySession;
use replaylab_core::signals::{MaCrossSignals, SignalSource};
use replaylab_core::ReplayError;

pub const DEFAULT_USER_ID: i64 = 1;
pub const INITIAL_BALANCE: f64 = 10_000.0;
const RECENT_TRANSACTION_LIMIT: usize = 10;
const ERROR_HISTORY_CAP: usize = 50;

/// MA overlay presets cycled by the add-MA key, in order.
pub const MA_PRESETS: [(MaKind, usize, &str); 4] = [
    (MaKind::Sma, 20, "#00ffff"),
    (MaKind::Sma, 50, "#9370db"),
    (MaKind::Ema, 10, "#ff8c00"),
    (MaKind::Ema, 21, "#00ff80"),
];

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An entry in the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub message: String,
    pub context: String,
}

/// Modal text-entry state. While not `Normal`, keys feed the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Quantity entry for a pending trade.
    Quantity { side: TradeSide, buffer: String },
    /// New account balance entry.
    Balance { buffer: String },
    /// Symbol search, matched against the current market's universe.
    Search { buffer: String },
}

/// Positions and recent transactions shown in the portfolio panel.
#[derive(Debug, Clone, Default)]
pub struct PortfolioView {
    pub positions: Vec<Position>,
    pub recent: Vec<Transaction>,
}

pub struct AppState {
    pub running: bool,

    // Backing services
    pub ledger: Arc<LedgerStore>,
    pub provider: Box<dyn BarProvider>,
    pub user_id: i64,

    // Selection
    pub market: Market,
    pub timeframe: Timeframe,
    pub symbols: Vec<String>,
    /// Last symbol that loaded successfully, used as the fallback target
    /// when a random pick or search has no data.
    pub last_symbol: Option<String>,

    // Replay
    pub session: Option<ReplaySession>,
    pub payload: Option<RenderPayload>,
    pub signals_on: bool,
    pub chart_kind: ChartKind,
    pub moving_averages: Vec<MovingAverageSpec>,

    // Panels and overlays
    pub show_portfolio: bool,
    pub show_help: bool,
    pub portfolio: PortfolioView,
    pub balance: f64,

    // Cross-cutting
    pub input_mode: InputMode,
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub state_path: PathBuf,

    rng: StdRng,
}

impl AppState {
    pub fn new(
        ledger: Arc<LedgerStore>,
        provider: Box<dyn BarProvider>,
        state_path: PathBuf,
        seed: u64,
    ) -> Result<Self, ReplayError> {
        ledger.init_user(DEFAULT_USER_ID, INITIAL_BALANCE)?;
        let balance = ledger.balance(DEFAULT_USER_ID)?;
        let mut app = Self {
            running: true,
            ledger,
            provider,
            user_id: DEFAULT_USER_ID,
            market: Market::Crypto,
            timeframe: Timeframe::H1,
            symbols: Vec::new(),
            last_symbol: None,
            session: None,
            payload: None,
            signals_on: false,
            chart_kind: ChartKind::Candles,
            moving_averages: Vec::new(),
            show_portfolio: false,
            show_help: false,
            portfolio: PortfolioView::default(),
            balance,
            input_mode: InputMode::Normal,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            state_path,
            rng: StdRng::seed_from_u64(seed),
        };
        app.refresh_symbols();
        Ok(app)
    }

    // ── Status / errors ──────────────────────────────────────────────────

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    /// Record an error in the history, capped, and surface it in the status bar.
    pub fn push_error(&mut self, message: String, context: impl Into<String>) {
        self.error_history.push_front(ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            message: message.clone(),
            context: context.into(),
        });
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    // ── Symbol loading ───────────────────────────────────────────────────

    pub fn refresh_symbols(&mut self) {
        match self.provider.list_symbols(self.market) {
            Ok(symbols) => self.symbols = symbols,
            Err(e) => {
                self.symbols.clear();
                self.push_error(e.to_string(), format!("list {}", self.market.label()));
            }
        }
    }

    /// Load a symbol on the current market/timeframe. On failure, falls back
    /// to the previous symbol so the chart never goes blank mid-session.
    pub fn load_symbol(&mut self, symbol: &str) {
        match self.try_open(symbol) {
            Ok(()) => {
                self.last_symbol = Some(symbol.to_string());
                self.set_status(format!(
                    "{} {} {}",
                    self.market.label(),
                    symbol,
                    self.timeframe.label()
                ));
            }
            Err(e) => {
                let fallback = self
                    .last_symbol
                    .clone()
                    .filter(|prev| prev != symbol);
                self.push_error(e.to_string(), symbol.to_string());
                if let Some(prev) = fallback {
                    if self.try_open(&prev).is_ok() {
                        self.set_warning(format!("{symbol} unavailable, kept {prev}"));
                    }
                }
            }
        }
    }

    /// Pick a random symbol from the current market's universe, excluding the
    /// one already loaded, and load it.
    pub fn load_random_symbol(&mut self) {
        if self.symbols.is_empty() {
            self.refresh_symbols();
        }
        let candidates: Vec<String> = self
            .symbols
            .iter()
            .filter(|s| Some(*s) != self.last_symbol.as_ref())
            .cloned()
            .collect();
        if candidates.is_empty() {
            self.set_warning(format!("no other symbols for {}", self.market.label()));
            return;
        }
        let idx = self.rng.gen_range(0..candidates.len());
        self.load_symbol(&candidates[idx]);
    }

    fn try_open(&mut self, symbol: &str) -> Result<(), ReplayError> {
        let series = self
            .provider
            .fetch_bars(symbol, self.market, self.timeframe)?;
        let seed = self.rng.gen();
        let mut session =
            ReplaySession::open(self.ledger.clone(), series, self.user_id, seed)?;
        // Carry the user's chart configuration across symbol switches.
        for spec in &self.moving_averages {
            session.add_moving_average(spec.clone());
        }
        session.set_chart_kind(self.chart_kind);
        if self.signals_on {
            let signals = MaCrossSignals::default_params().compute(session.series());
            session.set_signals(signals);
        }
        self.payload = Some(session.render());
        self.session = Some(session);
        Ok(())
    }

    // ── Session actions ──────────────────────────────────────────────────

    /// Run a fallible session action; on success the payload is replaced, on
    /// failure the previous payload stays on screen and the error is surfaced.
    pub fn with_session(
        &mut self,
        context: &str,
        f: impl FnOnce(&mut ReplaySession) -> Result<RenderPayload, ReplayError>,
    ) {
        let Some(session) = self.session.as_mut() else {
            self.set_warning("no symbol loaded");
            return;
        };
        match f(session) {
            Ok(payload) => self.payload = Some(payload),
            Err(e) => self.push_error(e.to_string(), context.to_string()),
        }
    }

    /// Execute a trade for the entered quantity, refreshing balance and
    /// portfolio on success.
    pub fn execute_trade(&mut self, side: TradeSide, quantity: f64) {
        let context = format!("{} {quantity}", side.label());
        self.with_session(&context, |session| match side {
            TradeSide::Buy => session.buy(quantity),
            TradeSide::Sell => session.sell(quantity),
        });
        self.refresh_balance();
        if self.show_portfolio {
            self.refresh_portfolio();
        }
    }

    /// Max quantity for the pending trade side, for the fill-max key.
    pub fn max_quantity(&self, side: TradeSide) -> Result<f64, ReplayError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(0.0);
        };
        match side {
            TradeSide::Buy => session.max_buy_quantity(),
            TradeSide::Sell => session.max_sell_quantity(),
        }
    }

    /// Cycle through the MA presets, adding the first one not already shown.
    pub fn add_next_moving_average(&mut self) {
        let next = MA_PRESETS.iter().find(|(kind, period, _)| {
            !self
                .moving_averages
                .iter()
                .any(|spec| spec.kind == *kind && spec.period == *period)
        });
        let Some(&(kind, period, color)) = next else {
            self.set_warning("all MA presets shown");
            return;
        };
        let spec = MovingAverageSpec {
            kind,
            period,
            color: color.to_string(),
        };
        self.moving_averages.push(spec.clone());
        let label = spec.label();
        self.with_session(&label, |session| Ok(session.add_moving_average(spec)));
        self.set_status(format!("added {label}"));
    }

    pub fn remove_last_moving_average(&mut self) {
        if self.moving_averages.is_empty() {
            return;
        }
        let index = self.moving_averages.len() - 1;
        let label = self.moving_averages[index].label();
        self.moving_averages.pop();
        self.with_session(&label, |session| {
            Ok(session.remove_moving_average(index))
        });
        self.set_status(format!("removed {label}"));
    }

    pub fn toggle_chart_kind(&mut self) {
        self.chart_kind = self.chart_kind.toggle();
        let kind = self.chart_kind;
        self.with_session(kind.label(), |session| Ok(session.set_chart_kind(kind)));
    }

    pub fn toggle_signals(&mut self) {
        self.signals_on = !self.signals_on;
        let on = self.signals_on;
        self.with_session("signals", |session| {
            if on {
                let signals = MaCrossSignals::default_params().compute(session.series());
                Ok(session.set_signals(signals))
            } else {
                Ok(session.clear_signals())
            }
        });
        let source = MaCrossSignals::default_params();
        self.set_status(if on {
            format!("{} signals on", source.name())
        } else {
            "signals off".to_string()
        });
    }

    // ── Market / timeframe cycling ───────────────────────────────────────

    pub fn cycle_market(&mut self) {
        let all = Market::ALL;
        let idx = all.iter().position(|m| *m == self.market).unwrap_or(0);
        self.market = all[(idx + 1) % all.len()];
        self.last_symbol = None;
        self.refresh_symbols();
        self.load_random_symbol();
    }

    pub fn cycle_timeframe(&mut self) {
        let all = Timeframe::ALL;
        let idx = all.iter().position(|t| *t == self.timeframe).unwrap_or(0);
        self.timeframe = all[(idx + 1) % all.len()];
        if let Some(symbol) = self.last_symbol.clone() {
            self.load_symbol(&symbol);
        }
    }

    // ── Ledger views ─────────────────────────────────────────────────────

    pub fn refresh_balance(&mut self) {
        match self.ledger.balance(self.user_id) {
            Ok(balance) => self.balance = balance,
            Err(e) => self.push_error(e.to_string(), "balance"),
        }
    }

    pub fn set_balance(&mut self, value: f64) {
        match self.ledger.set_balance(self.user_id, value) {
            Ok(()) => {
                self.balance = value;
                self.set_status(format!("balance set to {value:.2}"));
            }
            Err(e) => self.push_error(e.to_string(), "set balance"),
        }
    }

    /// Reload open positions and the recent-transaction tail.
    pub fn refresh_portfolio(&mut self) {
        let positions = self
            .ledger
            .positions(self.user_id)
            .map(|ps| ps.into_iter().filter(|p| p.quantity > 0.0).collect());
        let recent = self
            .ledger
            .recent_transactions(self.user_id, RECENT_TRANSACTION_LIMIT);
        match (positions, recent) {
            (Ok(positions), Ok(recent)) => {
                self.portfolio = PortfolioView { positions, recent };
            }
            (Err(e), _) | (_, Err(e)) => self.push_error(e.to_string(), "portfolio"),
        }
    }
}
