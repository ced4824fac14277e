//! ReplayLab CLI — ledger inspection and export commands.
//!
//! Commands:
//! - `init` — create a user account with a starting balance
//! - `balance` — show or set an account balance
//! - `positions` — list open positions
//! - `history` — print a symbol's transaction log, optionally as CSV
//! - `symbols` — list symbols available under a CSV data directory

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use replaylab_core::data::{BarProvider, CsvBarProvider};
use replaylab_core::domain::{Market, Transaction};
use replaylab_core::ledger::{AccountKey, LedgerStore};

#[derive(Parser)]
#[command(
    name = "replaylab",
    about = "ReplayLab CLI — paper-trading ledger tools"
)]
struct Cli {
    /// Ledger database path. Defaults to the app data directory.
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// User id. Defaults to 1 (the TUI's account).
    #[arg(long, global = true, default_value_t = 1)]
    user: i64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the account if it does not exist yet.
    Init {
        /// Starting balance.
        #[arg(long, default_value_t = 10_000.0)]
        balance: f64,
    },
    /// Show the account balance, or set it with --set.
    Balance {
        /// New balance to write instead of reading.
        #[arg(long)]
        set: Option<f64>,
    },
    /// List open positions (quantity > 0).
    Positions,
    /// Print the transaction log for one symbol.
    History {
        /// Symbol, e.g. BTCUSDT.
        symbol: String,

        /// Market label: BIST, Forex, Crypto, NASDAQ.
        #[arg(long, default_value = "Crypto")]
        market: String,

        /// Write the log as CSV to this path instead of printing a table.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// List symbols available under a CSV data directory.
    Symbols {
        /// Market label: BIST, Forex, Crypto, NASDAQ.
        #[arg(long, default_value = "Crypto")]
        market: String,

        /// CSV data directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let ledger_path = match cli.ledger {
        Some(path) => path,
        None => default_ledger_path()?,
    };

    match cli.command {
        Commands::Init { balance } => run_init(&ledger_path, cli.user, balance),
        Commands::Balance { set } => run_balance(&ledger_path, cli.user, set),
        Commands::Positions => run_positions(&ledger_path, cli.user),
        Commands::History {
            symbol,
            market,
            csv,
        } => run_history(&ledger_path, cli.user, &symbol, &market, csv.as_deref()),
        Commands::Symbols { market, data_dir } => run_symbols(&market, &data_dir),
    }
}

fn default_ledger_path() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("replaylab");
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir.join("ledger.db"))
}

fn parse_market(label: &str) -> Result<Market> {
    match Market::from_label(label) {
        Some(market) => Ok(market),
        None => bail!("unknown market '{label}'. Valid: BIST, Forex, Crypto, NASDAQ"),
    }
}

fn open_ledger(path: &Path) -> Result<LedgerStore> {
    LedgerStore::open(path).with_context(|| format!("opening ledger {}", path.display()))
}

fn run_init(ledger_path: &Path, user: i64, balance: f64) -> Result<()> {
    let ledger = open_ledger(ledger_path)?;
    ledger.init_user(user, balance)?;
    println!(
        "user {user} ready with balance {:.2} ({})",
        ledger.balance(user)?,
        ledger_path.display()
    );
    Ok(())
}

fn run_balance(ledger_path: &Path, user: i64, set: Option<f64>) -> Result<()> {
    let ledger = open_ledger(ledger_path)?;
    if let Some(value) = set {
        ledger.set_balance(user, value)?;
    }
    println!("{:.2}", ledger.balance(user)?);
    Ok(())
}

fn run_positions(ledger_path: &Path, user: i64) -> Result<()> {
    let ledger = open_ledger(ledger_path)?;
    let positions: Vec<_> = ledger
        .positions(user)?
        .into_iter()
        .filter(|p| p.quantity > 0.0)
        .collect();

    if positions.is_empty() {
        println!("no open positions for user {user}");
        return Ok(());
    }

    println!(
        "{:<12} {:<8} {:>12} {:>12} {:>14}",
        "Symbol", "Market", "Quantity", "Avg Price", "Total Cost"
    );
    println!("{}", "-".repeat(62));
    for pos in &positions {
        println!(
            "{:<12} {:<8} {:>12.4} {:>12.2} {:>14.2}",
            pos.symbol,
            pos.market.label(),
            pos.quantity,
            pos.avg_price,
            pos.total_cost
        );
    }
    Ok(())
}

fn run_history(
    ledger_path: &Path,
    user: i64,
    symbol: &str,
    market: &str,
    csv_out: Option<&Path>,
) -> Result<()> {
    let market = parse_market(market)?;
    let ledger = open_ledger(ledger_path)?;
    let key = AccountKey::new(user, symbol, market);
    let log = ledger.transactions_for(&key)?;

    if log.is_empty() {
        println!("no transactions for {symbol} on {}", market.label());
        return Ok(());
    }

    if let Some(path) = csv_out {
        write_history_csv(path, &log)?;
        println!("{} transactions written to {}", log.len(), path.display());
        return Ok(());
    }

    println!(
        "{:<6} {:<17} {:<5} {:>10} {:>12} {:>12} {:>10}",
        "Id", "Bar Time", "Side", "Quantity", "Price", "Amount", "P&L"
    );
    println!("{}", "-".repeat(78));
    let mut realized = 0.0;
    for txn in &log {
        realized += txn.profit_loss;
        println!(
            "{:<6} {:<17} {:<5} {:>10.4} {:>12.2} {:>12.2} {:>10.2}",
            txn.id,
            txn.chart_timestamp.format("%Y-%m-%d %H:%M"),
            txn.side.label(),
            txn.quantity,
            txn.price,
            txn.total_amount,
            txn.profit_loss
        );
    }
    println!("{}", "-".repeat(78));
    println!("realized P&L: {realized:.2}");
    Ok(())
}

fn write_history_csv(path: &Path, log: &[Transaction]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([
        "id",
        "side",
        "symbol",
        "market",
        "quantity",
        "price",
        "total_amount",
        "profit_loss",
        "chart_timestamp",
        "executed_at",
    ])?;
    for txn in log {
        writer.write_record([
            txn.id.to_string(),
            txn.side.label().to_string(),
            txn.symbol.clone(),
            txn.market.label().to_string(),
            txn.quantity.to_string(),
            txn.price.to_string(),
            txn.total_amount.to_string(),
            txn.profit_loss.to_string(),
            txn.chart_timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            txn.executed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn run_symbols(market: &str, data_dir: &Path) -> Result<()> {
    let market = parse_market(market)?;
    let provider = CsvBarProvider::new(data_dir);
    let symbols = provider.list_symbols(market)?;
    if symbols.is_empty() {
        println!(
            "no symbols for {} under {}",
            market.label(),
            data_dir.display()
        );
        return Ok(());
    }
    for symbol in symbols {
        println!("{symbol}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn parse_market_accepts_labels() {
        assert_eq!(parse_market("Crypto").unwrap(), Market::Crypto);
        assert_eq!(parse_market("NASDAQ").unwrap(), Market::Nasdaq);
        assert!(parse_market("NYSE").is_err());
    }

    #[test]
    fn history_csv_roundtrips_through_reader() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open_ledger(&dir.path().join("ledger.db")).unwrap();
        ledger.init_user(1, 10_000.0).unwrap();
        let key = AccountKey::new(1, "BTCUSDT", Market::Crypto);
        ledger.apply_buy(&key, 2.0, 100.0, ts()).unwrap();
        ledger
            .apply_sell(&key, 1.0, 110.0, ts() + chrono::Duration::hours(1))
            .unwrap();

        let out = dir.path().join("history.csv");
        let log = ledger.transactions_for(&key).unwrap();
        write_history_csv(&out, &log).unwrap();

        let mut reader = csv::Reader::from_path(&out).unwrap();
        let rows: Vec<csv::StringRecord> =
            reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "BUY");
        assert_eq!(&rows[1][1], "SELL");
        assert_eq!(&rows[1][7], "10");
    }

    #[test]
    fn init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        run_init(&path, 1, 10_000.0).unwrap();
        run_init(&path, 1, 99_999.0).unwrap(); // second init must not reset
        let ledger = open_ledger(&path).unwrap();
        assert_eq!(ledger.balance(1).unwrap(), 10_000.0);
    }
}
