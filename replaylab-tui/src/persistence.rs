//! App state persistence — JSON save/load across restarts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use replaylab_core::chart::{ChartKind, MovingAverageSpec};
use replaylab_core::domain::{Market, Timeframe};

/// Serializable subset of app state that persists across restarts.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedState {
    pub market: Market,
    pub timeframe: Timeframe,
    pub symbol: Option<String>,
    pub chart_kind: ChartKind,
    pub moving_averages: Vec<MovingAverageSpec>,
    pub signals_on: bool,
    pub show_portfolio: bool,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            market: Market::Crypto,
            timeframe: Timeframe::H1,
            symbol: None,
            chart_kind: ChartKind::Candles,
            moving_averages: Vec::new(),
            signals_on: false,
            show_portfolio: false,
        }
    }
}

/// Load persisted state from disk. Returns defaults if file is missing or corrupt.
pub fn load(path: &Path) -> PersistedState {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => PersistedState::default(),
    }
}

/// Save persisted state to disk. Creates parent directories if needed.
pub fn save(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Extract persisted state from AppState.
pub fn extract(app: &crate::app::AppState) -> PersistedState {
    PersistedState {
        market: app.market,
        timeframe: app.timeframe,
        symbol: app.last_symbol.clone(),
        chart_kind: app.chart_kind,
        moving_averages: app.moving_averages.clone(),
        signals_on: app.signals_on,
        show_portfolio: app.show_portfolio,
    }
}

/// Apply persisted state to AppState and reload the saved symbol, if any.
pub fn apply(app: &mut crate::app::AppState, state: PersistedState) {
    app.market = state.market;
    app.timeframe = state.timeframe;
    app.chart_kind = state.chart_kind;
    app.moving_averages = state.moving_averages;
    app.signals_on = state.signals_on;
    app.show_portfolio = state.show_portfolio;
    app.refresh_symbols();
    match state.symbol {
        Some(symbol) => app.load_symbol(&symbol),
        None => app.load_random_symbol(),
    }
    if app.show_portfolio {
        app.refresh_portfolio();
    }
}
