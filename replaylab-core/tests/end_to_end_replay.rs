//! End-to-end replay: synthetic data → session → trades → reload.

use std::sync::Arc;

use replaylab_core::chart::{ChartKind, MaKind, MovingAverageSpec};
use replaylab_core::data::{BarProvider, SyntheticProvider};
use replaylab_core::domain::{Market, Timeframe, TradeSide};
use replaylab_core::ledger::{AccountKey, LedgerStore};
use replaylab_core::session::ReplaySession;
use replaylab_core::signals::{MaCrossSignals, SignalSource};
use replaylab_core::ReplayError;

fn open_ledger(dir: &tempfile::TempDir) -> Arc<LedgerStore> {
    let ledger = LedgerStore::open(&dir.path().join("ledger.db")).unwrap();
    ledger.init_user(1, 10_000.0).unwrap();
    Arc::new(ledger)
}

#[test]
fn full_session_flow() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open_ledger(&dir);
    let provider = SyntheticProvider::new(42);

    let series = provider
        .fetch_bars("BTCUSDT", Market::Crypto, Timeframe::H1)
        .unwrap();
    let signals = MaCrossSignals::default_params().compute(&series);

    let mut session = ReplaySession::open(ledger.clone(), series, 1, 42).unwrap();
    session.set_signals(signals);
    session.add_moving_average(MovingAverageSpec {
        kind: MaKind::Ema,
        period: 20,
        color: "#00ffff".into(),
    });

    // Jump into history and walk forward a bit.
    let payload = session.jump_random().unwrap();
    let start_visible = payload.visible_bars.len();
    let payload = session.step(1).unwrap();
    let payload2 = session.step(5).unwrap();
    assert_eq!(payload2.visible_bars.len(), payload.visible_bars.len() + 5);
    assert_eq!(payload2.visible_bars.len(), start_visible + 6);

    // Trade at the current bar.
    let price = session.cursor().current_price();
    let payload = session.buy(2.0).unwrap();
    assert_eq!(payload.overlay.trade_markers.len(), 1);
    assert!((ledger.balance(1).unwrap() - (10_000.0 - 2.0 * price)).abs() < 1e-9);

    let payload = session.step(5).unwrap();
    assert_eq!(payload.statistics.current_price, session.cursor().current_price());

    let sell_price = session.cursor().current_price();
    let payload = session.sell(2.0).unwrap();
    assert_eq!(payload.overlay.trade_markers.len(), 2);
    let expected = 10_000.0 + 2.0 * (sell_price - price);
    assert!((ledger.balance(1).unwrap() - expected).abs() < 1e-9);

    // Position fully closed.
    let key = AccountKey::new(1, "BTCUSDT", Market::Crypto);
    assert!(ledger.position(&key).unwrap().is_none());

    // Overlay respects the cutoff on every filtered marker.
    let cutoff = session.cursor().current_timestamp();
    for marker in &payload.overlay.trade_markers {
        assert!(marker.timestamp <= cutoff);
    }
    for signal in &payload.overlay.indicator_markers {
        assert!(signal.timestamp <= cutoff);
    }
}

#[test]
fn markers_survive_series_reload() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open_ledger(&dir);
    let provider = SyntheticProvider::new(7);

    let series = provider
        .fetch_bars("ETHUSDT", Market::Crypto, Timeframe::H4)
        .unwrap();
    let mut session = ReplaySession::open(ledger.clone(), series, 1, 1).unwrap();
    session.jump_random().unwrap();
    session.buy(1.0).unwrap();
    session.step(3).unwrap();
    session.buy(1.0).unwrap();
    drop(session);

    // Same selection fetched again — markers come back from the ledger.
    let series = provider
        .fetch_bars("ETHUSDT", Market::Crypto, Timeframe::H4)
        .unwrap();
    let session = ReplaySession::open(ledger, series, 1, 2).unwrap();
    assert_eq!(session.markers().len(), 2);
    assert!(session.markers().iter().all(|m| m.side == TradeSide::Buy));
}

#[test]
fn switching_chart_kind_keeps_ledger_and_markers() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open_ledger(&dir);
    let provider = SyntheticProvider::new(3);

    let series = provider
        .fetch_bars("AAPL", Market::Nasdaq, Timeframe::D1)
        .unwrap();
    let mut session = ReplaySession::open(ledger, series, 1, 3).unwrap();
    session.jump_random().unwrap();
    session.buy(1.0).unwrap();

    let candles = session.set_chart_kind(ChartKind::Candles);
    let ha = session.set_chart_kind(ChartKind::HeikinAshi);
    assert_eq!(
        candles.overlay.trade_markers,
        ha.overlay.trade_markers,
        "overlay must not depend on the candle transform"
    );
    assert_eq!(candles.visible_bars.len(), ha.visible_bars.len());
}

#[test]
fn no_data_permits_no_trading() {
    // A provider miss yields DataUnavailable before any session exists, so
    // there is no path to a trade without bars.
    let dir = tempfile::tempdir().unwrap();
    let _ledger = open_ledger(&dir);
    let provider = replaylab_core::data::CsvBarProvider::new(dir.path().join("empty"));
    let err = provider
        .fetch_bars("GARAN", Market::Bist, Timeframe::D1)
        .unwrap_err();
    assert!(matches!(err, ReplayError::DataUnavailable { .. }));
}
