//! Property tests for ledger accounting invariants.
//!
//! Uses proptest to verify:
//! 1. Replay equivalence — folding the transaction log with average-cost
//!    accounting reconstructs exactly the materialized position
//! 2. Round trip — buy then sell the same quantity at the same price restores
//!    the balance and realizes zero P&L
//! 3. Average-cost identity — after any sequence of buys,
//!    `avg_price == total_cost / quantity`
//! 4. Partial sells never move `avg_price`

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;

use replaylab_core::domain::{Market, TradeSide, Transaction};
use replaylab_core::ledger::{AccountKey, LedgerStore};

const EPSILON: f64 = 1e-6;

fn ts(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::minutes(i as i64)
}

fn open_store() -> (tempfile::TempDir, LedgerStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = LedgerStore::open(&dir.path().join("ledger.db")).unwrap();
    store.init_user(1, 1e12).unwrap(); // large enough that funds never bind
    (dir, store)
}

fn key() -> AccountKey {
    AccountKey::new(1, "BTCUSDT", Market::Crypto)
}

/// Reconstruct a position by replaying the transaction log with the
/// average-cost update rule. Returns (quantity, avg_price, total_cost).
fn replay_log(log: &[Transaction]) -> (f64, f64, f64) {
    let mut qty = 0.0;
    let mut total_cost = 0.0;
    let mut avg = 0.0;
    for txn in log {
        match txn.side {
            TradeSide::Buy => {
                qty += txn.quantity;
                total_cost += txn.quantity * txn.price;
                avg = total_cost / qty;
            }
            TradeSide::Sell => {
                qty -= txn.quantity;
                total_cost = avg * qty;
            }
        }
    }
    (qty, avg, total_cost)
}

// ── Strategies ───────────────────────────────────────────────────────

fn arb_quantity() -> impl Strategy<Value = f64> {
    (1.0..100.0_f64).prop_map(|q| (q * 100.0).round() / 100.0)
}

fn arb_price() -> impl Strategy<Value = f64> {
    (10.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

/// (is_buy, quantity, price) — sells are shrunk to the held amount at apply time.
fn arb_actions() -> impl Strategy<Value = Vec<(bool, f64, f64)>> {
    prop::collection::vec((any::<bool>(), arb_quantity(), arb_price()), 1..20)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The materialized position equals the position reconstructed by
    /// replaying the transaction log.
    #[test]
    fn materialized_position_matches_log_replay(actions in arb_actions()) {
        let (_dir, store) = open_store();
        let key = key();

        let mut held = 0.0_f64;
        for (i, (is_buy, qty, price)) in actions.iter().enumerate() {
            if *is_buy {
                store.apply_buy(&key, *qty, *price, ts(i)).unwrap();
                held += qty;
            } else if held > 0.0 {
                let sell_qty = qty.min(held);
                store.apply_sell(&key, sell_qty, *price, ts(i)).unwrap();
                held -= sell_qty;
            }
        }

        let log = store.transactions_for(&key).unwrap();
        let (replay_qty, replay_avg, replay_cost) = replay_log(&log);
        match store.position(&key).unwrap() {
            Some(pos) => {
                prop_assert!((pos.quantity - replay_qty).abs() < EPSILON);
                prop_assert!((pos.avg_price - replay_avg).abs() < EPSILON);
                prop_assert!((pos.total_cost - replay_cost).abs() < EPSILON);
            }
            None => prop_assert!(replay_qty.abs() < EPSILON),
        }
    }

    /// Buy then sell the same quantity at the same price: balance returns to
    /// its pre-trade value and the sell realizes zero P&L.
    #[test]
    fn round_trip_restores_balance(qty in arb_quantity(), price in arb_price()) {
        let (_dir, store) = open_store();
        let key = key();
        let before = store.balance(1).unwrap();

        store.apply_buy(&key, qty, price, ts(0)).unwrap();
        let sell = store.apply_sell(&key, qty, price, ts(1)).unwrap();

        prop_assert!(sell.profit_loss.abs() < EPSILON);
        prop_assert!((store.balance(1).unwrap() - before).abs() < EPSILON);
        prop_assert!(store.position(&key).unwrap().is_none());
    }

    /// After buys only, avg_price == total_cost / quantity within tolerance.
    #[test]
    fn average_cost_identity_after_buys(
        buys in prop::collection::vec((arb_quantity(), arb_price()), 1..10)
    ) {
        let (_dir, store) = open_store();
        let key = key();
        for (i, (qty, price)) in buys.iter().enumerate() {
            store.apply_buy(&key, *qty, *price, ts(i)).unwrap();
        }
        let pos = store.position(&key).unwrap().unwrap();
        prop_assert!((pos.avg_price - pos.total_cost / pos.quantity).abs() < EPSILON);
        prop_assert!(pos.cost_consistent(EPSILON * pos.total_cost.max(1.0)));
    }

    /// A partial sell leaves avg_price untouched, whatever the sell price.
    #[test]
    fn partial_sell_never_moves_avg_price(
        buy_qty in 10.0..100.0_f64,
        buy_price in arb_price(),
        sell_fraction in 0.1..0.9_f64,
        sell_price in arb_price(),
    ) {
        let (_dir, store) = open_store();
        let key = key();
        store.apply_buy(&key, buy_qty, buy_price, ts(0)).unwrap();
        let before = store.position(&key).unwrap().unwrap();

        let sell_qty = buy_qty * sell_fraction;
        let txn = store.apply_sell(&key, sell_qty, sell_price, ts(1)).unwrap();

        let after = store.position(&key).unwrap().unwrap();
        prop_assert_eq!(after.avg_price, before.avg_price);
        prop_assert!((after.quantity - (buy_qty - sell_qty)).abs() < EPSILON);
        prop_assert!(
            (txn.profit_loss - (sell_price - before.avg_price) * sell_qty).abs() < EPSILON
        );
        // Cost basis is recomputed as avg * remaining.
        prop_assert!((after.total_cost - after.avg_price * after.quantity).abs() < EPSILON);
    }
}

/// The documented worked example: BUY 10 @ 100, SELL 4 @ 150.
#[test]
fn worked_example_partial_sell() {
    let (_dir, store) = open_store();
    let key = key();
    store.set_balance(1, 10_000.0).unwrap();

    store.apply_buy(&key, 10.0, 100.0, ts(0)).unwrap();
    let sell = store.apply_sell(&key, 4.0, 150.0, ts(1)).unwrap();

    assert_eq!(sell.profit_loss, 200.0);
    let pos = store.position(&key).unwrap().unwrap();
    assert_eq!(pos.quantity, 6.0);
    assert_eq!(pos.avg_price, 100.0);
    assert_eq!(pos.total_cost, 600.0);
    assert_eq!(store.balance(1).unwrap(), 10_000.0 - 1000.0 + 600.0);
}
