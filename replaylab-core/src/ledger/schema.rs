//! SQLite schema for the trading ledger.
//!
//! Three durable tables: users (cash), positions (materialized average-cost
//! aggregates, unique per account key), and the append-only transaction log.

use rusqlite::Connection;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id       INTEGER PRIMARY KEY,
    username TEXT UNIQUE,
    balance  REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS positions (
    id         INTEGER PRIMARY KEY,
    user_id    INTEGER NOT NULL,
    symbol     TEXT NOT NULL,
    market     TEXT NOT NULL,
    quantity   REAL NOT NULL,
    avg_price  REAL NOT NULL,
    total_cost REAL NOT NULL,
    UNIQUE (user_id, symbol, market),
    FOREIGN KEY (user_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS transactions (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         INTEGER NOT NULL,
    symbol          TEXT NOT NULL,
    market          TEXT NOT NULL,
    side            TEXT NOT NULL,
    quantity        REAL NOT NULL,
    price           REAL NOT NULL,
    total_amount    REAL NOT NULL,
    profit_loss     REAL NOT NULL,
    executed_at     DATETIME NOT NULL,
    chart_timestamp DATETIME NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users (id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_account_chart
    ON transactions (user_id, symbol, market, chart_timestamp);
";

/// Apply the schema. Idempotent.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}
