//! Ledger — cash balance, positions, and the append-only transaction log.
//!
//! One `LedgerStore` owns one SQLite connection pool. Trade application is a
//! single commit-or-rollback transaction touching balance, position, and the
//! transaction log together, and concurrent calls for the same
//! `(user, symbol, market)` key are serialized through a per-key critical
//! section so a concurrent buy/sell pair can never interleave reads and
//! writes of the same aggregate.
//!
//! Accounting is average-cost: a BUY folds its cost into the weighted average,
//! a SELL realizes `(price - avg_price) * quantity` and leaves `avg_price` of
//! the remainder untouched. A position whose quantity reaches zero is deleted,
//! not stored with zero fields.

mod schema;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Row};

use crate::domain::{Market, Position, TradeSide, Transaction};
use crate::error::ReplayError;

pub use schema::init_schema;

/// The `(user, symbol, market)` aggregate key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountKey {
    pub user_id: i64,
    pub symbol: String,
    pub market: Market,
}

impl AccountKey {
    pub fn new(user_id: i64, symbol: impl Into<String>, market: Market) -> Self {
        Self {
            user_id,
            symbol: symbol.into(),
            market,
        }
    }
}

/// Durable ledger store backed by SQLite.
pub struct LedgerStore {
    pool: Pool<SqliteConnectionManager>,
    locks: Mutex<HashMap<AccountKey, Arc<Mutex<()>>>>,
}

impl LedgerStore {
    /// Open (creating if needed) the ledger database at `path`.
    pub fn open(path: &Path) -> Result<Self, ReplayError> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
            Ok(())
        });
        let pool = Pool::builder().max_size(4).build(manager)?;
        let conn = pool.get()?;
        schema::init_schema(&conn)?;
        Ok(Self {
            pool,
            locks: Mutex::new(HashMap::new()),
        })
    }

    fn key_lock(&self, key: &AccountKey) -> Arc<Mutex<()>> {
        let mut map = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(key.clone()).or_default().clone()
    }

    /// Create the user with an initial balance if missing. Idempotent.
    pub fn init_user(&self, user_id: i64, initial_balance: f64) -> Result<(), ReplayError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR IGNORE INTO users (id, username, balance) VALUES (?1, ?2, ?3)",
            params![user_id, format!("user_{user_id}"), initial_balance],
        )?;
        Ok(())
    }

    pub fn balance(&self, user_id: i64) -> Result<f64, ReplayError> {
        let conn = self.pool.get()?;
        conn.query_row(
            "SELECT balance FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => ReplayError::UnknownUser { user_id },
            other => other.into(),
        })
    }

    /// Administrative override: replace the balance unconditionally. No
    /// transaction is recorded.
    pub fn set_balance(&self, user_id: i64, value: f64) -> Result<(), ReplayError> {
        if value < 0.0 {
            return Err(ReplayError::NegativeBalance);
        }
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE users SET balance = ?1 WHERE id = ?2",
            params![value, user_id],
        )?;
        if updated == 0 {
            return Err(ReplayError::UnknownUser { user_id });
        }
        Ok(())
    }

    pub fn position(&self, key: &AccountKey) -> Result<Option<Position>, ReplayError> {
        let conn = self.pool.get()?;
        let result = conn.query_row(
            "SELECT user_id, symbol, market, quantity, avg_price, total_cost
             FROM positions WHERE user_id = ?1 AND symbol = ?2 AND market = ?3",
            params![key.user_id, key.symbol, key.market.label()],
            position_from_row,
        );
        match result {
            Ok(pos) => Ok(Some(pos)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All open positions for a user (quantity > 0 by construction).
    pub fn positions(&self, user_id: i64) -> Result<Vec<Position>, ReplayError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, symbol, market, quantity, avg_price, total_cost
             FROM positions WHERE user_id = ?1 ORDER BY symbol",
        )?;
        let rows = stmt
            .query_map(params![user_id], position_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Apply a BUY atomically: debit cash, fold cost into the average, append
    /// the transaction. Fails whole on insufficient funds.
    pub fn apply_buy(
        &self,
        key: &AccountKey,
        quantity: f64,
        price: f64,
        chart_timestamp: NaiveDateTime,
    ) -> Result<Transaction, ReplayError> {
        if quantity <= 0.0 {
            return Err(ReplayError::InvalidQuantity);
        }
        let lock = self.key_lock(key);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let balance: f64 = tx
            .query_row(
                "SELECT balance FROM users WHERE id = ?1",
                params![key.user_id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => ReplayError::UnknownUser {
                    user_id: key.user_id,
                },
                other => other.into(),
            })?;

        let total_cost = quantity * price;
        if total_cost > balance {
            return Err(ReplayError::InsufficientFunds {
                needed: total_cost,
                available: balance,
            });
        }

        let existing = query_position(&tx, key)?;
        let (new_qty, new_total_cost) = match &existing {
            Some(pos) => (pos.quantity + quantity, pos.total_cost + total_cost),
            None => (quantity, total_cost),
        };
        let new_avg = new_total_cost / new_qty;

        tx.execute(
            "UPDATE users SET balance = ?1 WHERE id = ?2",
            params![balance - total_cost, key.user_id],
        )?;
        upsert_position(&tx, key, new_qty, new_avg, new_total_cost)?;
        let txn = insert_transaction(
            &tx,
            key,
            TradeSide::Buy,
            quantity,
            price,
            total_cost,
            0.0,
            chart_timestamp,
        )?;

        tx.commit()?;
        Ok(txn)
    }

    /// Apply a SELL atomically: credit cash, realize P&L against the average
    /// cost, shrink or delete the position, append the transaction.
    pub fn apply_sell(
        &self,
        key: &AccountKey,
        quantity: f64,
        price: f64,
        chart_timestamp: NaiveDateTime,
    ) -> Result<Transaction, ReplayError> {
        if quantity <= 0.0 {
            return Err(ReplayError::InvalidQuantity);
        }
        let lock = self.key_lock(key);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let pos = query_position(&tx, key)?.ok_or_else(|| ReplayError::NoPosition {
            symbol: key.symbol.clone(),
        })?;
        if quantity > pos.quantity {
            return Err(ReplayError::InsufficientQuantity {
                requested: quantity,
                held: pos.quantity,
            });
        }

        let balance: f64 = tx.query_row(
            "SELECT balance FROM users WHERE id = ?1",
            params![key.user_id],
            |row| row.get(0),
        )?;

        let total_amount = quantity * price;
        let profit_loss = (price - pos.avg_price) * quantity;
        let remaining = pos.quantity - quantity;

        tx.execute(
            "UPDATE users SET balance = ?1 WHERE id = ?2",
            params![balance + total_amount, key.user_id],
        )?;
        if remaining > 0.0 {
            // avg_price is untouched by a partial sell; cost basis is
            // recomputed from it rather than by subtracting proceeds.
            upsert_position(&tx, key, remaining, pos.avg_price, pos.avg_price * remaining)?;
        } else {
            tx.execute(
                "DELETE FROM positions WHERE user_id = ?1 AND symbol = ?2 AND market = ?3",
                params![key.user_id, key.symbol, key.market.label()],
            )?;
        }
        let txn = insert_transaction(
            &tx,
            key,
            TradeSide::Sell,
            quantity,
            price,
            total_amount,
            profit_loss,
            chart_timestamp,
        )?;

        tx.commit()?;
        Ok(txn)
    }

    /// The transaction log for one account key, ordered by chart timestamp —
    /// the order markers are replayed in when a series is reloaded.
    pub fn transactions_for(&self, key: &AccountKey) -> Result<Vec<Transaction>, ReplayError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, symbol, market, side, quantity, price, total_amount,
                    profit_loss, executed_at, chart_timestamp
             FROM transactions
             WHERE user_id = ?1 AND symbol = ?2 AND market = ?3
             ORDER BY chart_timestamp, id",
        )?;
        let rows = stmt
            .query_map(
                params![key.user_id, key.symbol, key.market.label()],
                transaction_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Most recent transactions for a user, newest first.
    pub fn recent_transactions(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<Transaction>, ReplayError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, symbol, market, side, quantity, price, total_amount,
                    profit_loss, executed_at, chart_timestamp
             FROM transactions WHERE user_id = ?1
             ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![user_id, limit as i64], transaction_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn query_position(
    conn: &rusqlite::Connection,
    key: &AccountKey,
) -> Result<Option<Position>, ReplayError> {
    let result = conn.query_row(
        "SELECT user_id, symbol, market, quantity, avg_price, total_cost
         FROM positions WHERE user_id = ?1 AND symbol = ?2 AND market = ?3",
        params![key.user_id, key.symbol, key.market.label()],
        position_from_row,
    );
    match result {
        Ok(pos) => Ok(Some(pos)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn upsert_position(
    conn: &rusqlite::Connection,
    key: &AccountKey,
    quantity: f64,
    avg_price: f64,
    total_cost: f64,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO positions (user_id, symbol, market, quantity, avg_price, total_cost)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (user_id, symbol, market)
         DO UPDATE SET quantity = ?4, avg_price = ?5, total_cost = ?6",
        params![
            key.user_id,
            key.symbol,
            key.market.label(),
            quantity,
            avg_price,
            total_cost
        ],
    )?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn insert_transaction(
    conn: &rusqlite::Connection,
    key: &AccountKey,
    side: TradeSide,
    quantity: f64,
    price: f64,
    total_amount: f64,
    profit_loss: f64,
    chart_timestamp: NaiveDateTime,
) -> rusqlite::Result<Transaction> {
    let executed_at = chrono::Local::now().naive_local();
    conn.execute(
        "INSERT INTO transactions
            (user_id, symbol, market, side, quantity, price, total_amount,
             profit_loss, executed_at, chart_timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            key.user_id,
            key.symbol,
            key.market.label(),
            side.label(),
            quantity,
            price,
            total_amount,
            profit_loss,
            executed_at,
            chart_timestamp
        ],
    )?;
    Ok(Transaction {
        id: conn.last_insert_rowid(),
        user_id: key.user_id,
        symbol: key.symbol.clone(),
        market: key.market,
        side,
        quantity,
        price,
        total_amount,
        profit_loss,
        executed_at,
        chart_timestamp,
    })
}

fn parse_market(row: &Row<'_>, idx: usize) -> rusqlite::Result<Market> {
    let label: String = row.get(idx)?;
    Market::from_label(&label).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown market '{label}'").into(),
        )
    })
}

fn position_from_row(row: &Row<'_>) -> rusqlite::Result<Position> {
    Ok(Position {
        user_id: row.get(0)?,
        symbol: row.get(1)?,
        market: parse_market(row, 2)?,
        quantity: row.get(3)?,
        avg_price: row.get(4)?,
        total_cost: row.get(5)?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let side_label: String = row.get(4)?;
    let side = TradeSide::from_label(&side_label).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown trade side '{side_label}'").into(),
        )
    })?;
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        symbol: row.get(2)?,
        market: parse_market(row, 3)?,
        side,
        quantity: row.get(5)?,
        price: row.get(6)?,
        total_amount: row.get(7)?,
        profit_loss: row.get(8)?,
        executed_at: row.get(9)?,
        chart_timestamp: row.get(10)?,
    })
}
