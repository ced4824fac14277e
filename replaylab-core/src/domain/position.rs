//! Position — materialized average-cost aggregate per `(user, symbol, market)`.

use serde::{Deserialize, Serialize};

use crate::domain::Market;

/// An open holding. A position row only exists while `quantity > 0`; closing a
/// position deletes the row rather than storing zeros.
///
/// Invariant: `total_cost ≈ quantity * avg_price` (maintained by the ledger,
/// never set independently).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub user_id: i64,
    pub symbol: String,
    pub market: Market,
    pub quantity: f64,
    pub avg_price: f64,
    pub total_cost: f64,
}

impl Position {
    pub fn market_value(&self, current_price: f64) -> f64 {
        self.quantity * current_price
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.quantity * (current_price - self.avg_price)
    }

    /// Check the cost-basis invariant within a floating tolerance.
    pub fn cost_consistent(&self, epsilon: f64) -> bool {
        (self.total_cost - self.quantity * self.avg_price).abs() <= epsilon
    }
}
