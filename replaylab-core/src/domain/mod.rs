//! Domain types: bars, instruments, positions, trades, signals.

mod bar;
mod instrument;
mod position;
mod signal;
mod trade;

pub use bar::{Bar, BarSeries};
pub use instrument::{Market, Timeframe};
pub use position::Position;
pub use signal::{IndicatorSignal, SignalKind};
pub use trade::{TradeMarker, TradeSide, Transaction};
