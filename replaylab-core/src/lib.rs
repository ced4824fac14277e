//! ReplayLab Core — bar-replay simulation engine with a persistent paper ledger.
//!
//! The heart of the simulator:
//! - Domain types (bars, series, positions, transactions, signals)
//! - Cursor state machine over the visible prefix of history
//! - SQLite-backed ledger with average-cost accounting
//! - Signal overlay with nearest-bar snapping
//! - Replay session orchestrating cursor, trades, and render payloads
//! - Data provider trait with CSV and synthetic implementations

pub mod chart;
pub mod cursor;
pub mod data;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod overlay;
pub mod session;
pub mod signals;
pub mod stats;

pub use error::ReplayError;
