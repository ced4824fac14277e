//! Structured error types for the replay engine.
//!
//! Validation failures are recovered at the trade-execution boundary and
//! surfaced as user-visible messages; `Storage` is the only variant treated as
//! potentially fatal to the current action. Retrying after `Storage` is safe
//! because trade application is transactional — no partial write survives.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("no data available for '{symbol}'")]
    DataUnavailable { symbol: String },

    #[error("bar series invalid: {0}")]
    InvalidSeries(String),

    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    #[error("insufficient funds: need {needed:.2}, have {available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("no open position in '{symbol}'")]
    NoPosition { symbol: String },

    #[error("insufficient quantity: requested {requested}, holding {held}")]
    InsufficientQuantity { requested: f64, held: f64 },

    #[error("cursor step to {requested} exceeds series length {len}")]
    CursorOutOfRange { requested: usize, len: usize },

    #[error("unknown user {user_id} — account not initialized")]
    UnknownUser { user_id: i64 },

    #[error("balance must be non-negative")]
    NegativeBalance,

    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for ReplayError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<r2d2::Error> for ReplayError {
    fn from(e: r2d2::Error) -> Self {
        Self::Storage(e.to_string())
    }
}
