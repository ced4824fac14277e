//! Keyboard input dispatch — modal entry first, then global replay keys.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use replaylab_core::domain::TradeSide;

use crate::app::{AppState, InputMode};

/// Handle a key event.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Help overlay consumes everything.
    if app.show_help {
        app.show_help = false;
        return;
    }

    // 2. Modal text entry.
    match app.input_mode.clone() {
        InputMode::Quantity { side, buffer } => {
            handle_quantity_entry(app, key, side, buffer);
            return;
        }
        InputMode::Balance { buffer } => {
            handle_balance_entry(app, key, buffer);
            return;
        }
        InputMode::Search { buffer } => {
            handle_search_entry(app, key, buffer);
            return;
        }
        InputMode::Normal => {}
    }

    // 3. Replay keys.
    match key.code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('?') => app.show_help = true,

        // Cursor
        KeyCode::Char('r') => app.with_session("jump", |s| s.jump_random()),
        KeyCode::Char('n') | KeyCode::Right => app.with_session("step", |s| s.step(1)),
        KeyCode::Char('N') => app.with_session("step", |s| s.step(5)),
        KeyCode::Char('a') => app.with_session("reveal", |s| s.reveal_all()),

        // Trading
        KeyCode::Char('b') => {
            app.input_mode = InputMode::Quantity {
                side: TradeSide::Buy,
                buffer: String::new(),
            };
        }
        KeyCode::Char('s') => {
            app.input_mode = InputMode::Quantity {
                side: TradeSide::Sell,
                buffer: String::new(),
            };
        }
        KeyCode::Char('B') => {
            app.input_mode = InputMode::Balance {
                buffer: String::new(),
            };
        }

        // Chart configuration
        KeyCode::Char('c') => app.toggle_chart_kind(),
        KeyCode::Char('i') => app.toggle_signals(),
        KeyCode::Char('o') => app.add_next_moving_average(),
        KeyCode::Char('O') => app.remove_last_moving_average(),

        // Selection
        KeyCode::Tab => app.cycle_market(),
        KeyCode::Char('t') => app.cycle_timeframe(),
        KeyCode::Char('y') => app.load_random_symbol(),
        KeyCode::Char('/') => {
            app.input_mode = InputMode::Search {
                buffer: String::new(),
            };
        }

        // Portfolio
        KeyCode::Char('p') => {
            app.show_portfolio = !app.show_portfolio;
            if app.show_portfolio {
                app.refresh_portfolio();
            }
        }
        _ => {}
    }
}

fn handle_quantity_entry(app: &mut AppState, key: KeyEvent, side: TradeSide, mut buffer: String) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            match buffer.trim().parse::<f64>() {
                Ok(quantity) => app.execute_trade(side, quantity),
                Err(_) => app.set_warning("quantity must be a number"),
            }
        }
        // Fill with the maximum the account allows.
        KeyCode::Char('m') => match app.max_quantity(side) {
            Ok(max) => {
                app.input_mode = InputMode::Quantity {
                    side,
                    buffer: format!("{max:.4}"),
                };
            }
            Err(e) => {
                app.input_mode = InputMode::Normal;
                app.push_error(e.to_string(), "max quantity");
            }
        },
        KeyCode::Backspace => {
            buffer.pop();
            app.input_mode = InputMode::Quantity { side, buffer };
        }
        KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => {
            buffer.push(c);
            app.input_mode = InputMode::Quantity { side, buffer };
        }
        _ => {}
    }
}

fn handle_balance_entry(app: &mut AppState, key: KeyEvent, mut buffer: String) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            match buffer.trim().parse::<f64>() {
                Ok(value) => app.set_balance(value),
                Err(_) => app.set_warning("balance must be a number"),
            }
        }
        KeyCode::Backspace => {
            buffer.pop();
            app.input_mode = InputMode::Balance { buffer };
        }
        KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => {
            buffer.push(c);
            app.input_mode = InputMode::Balance { buffer };
        }
        _ => {}
    }
}

fn handle_search_entry(app: &mut AppState, key: KeyEvent, mut buffer: String) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            let query = buffer.trim().to_uppercase();
            if query.is_empty() {
                return;
            }
            // Exact symbol first, then prefix match within the market.
            let target = app
                .symbols
                .iter()
                .find(|s| **s == query)
                .or_else(|| app.symbols.iter().find(|s| s.starts_with(&query)))
                .cloned()
                .unwrap_or(query);
            app.load_symbol(&target);
        }
        KeyCode::Backspace => {
            buffer.pop();
            app.input_mode = InputMode::Search { buffer };
        }
        KeyCode::Char(c) if c.is_ascii_alphanumeric() => {
            buffer.push(c.to_ascii_uppercase());
            app.input_mode = InputMode::Search { buffer };
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use replaylab_core::data::SyntheticProvider;
    use replaylab_core::ledger::LedgerStore;
    use std::sync::Arc;

    fn app() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let ledger =
            Arc::new(LedgerStore::open(&dir.path().join("ledger.db")).unwrap());
        let provider = Box::new(SyntheticProvider::new(42));
        let state_path = dir.path().join("state.json");
        let app = AppState::new(ledger, provider, state_path, 42).unwrap();
        (dir, app)
    }

    fn press(app: &mut AppState, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut AppState, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn q_quits() {
        let (_dir, mut app) = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }

    #[test]
    fn jump_and_step_drive_cursor() {
        let (_dir, mut app) = app();
        app.load_random_symbol();
        press(&mut app, KeyCode::Char('r'));
        let shown = app.payload.as_ref().unwrap().visible_bars.len();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('N'));
        assert_eq!(
            app.payload.as_ref().unwrap().visible_bars.len(),
            shown + 6
        );
    }

    #[test]
    fn buy_flow_through_quantity_entry() {
        let (_dir, mut app) = app();
        app.load_random_symbol();
        press(&mut app, KeyCode::Char('r'));

        press(&mut app, KeyCode::Char('b'));
        assert!(matches!(app.input_mode, InputMode::Quantity { .. }));
        type_str(&mut app, "2.5");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.session.as_ref().unwrap().markers().len(), 1);
        assert!(app.balance < crate::app::INITIAL_BALANCE);
    }

    #[test]
    fn esc_cancels_quantity_entry() {
        let (_dir, mut app) = app();
        app.load_random_symbol();
        press(&mut app, KeyCode::Char('s'));
        type_str(&mut app, "3");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.session.as_ref().unwrap().markers().is_empty());
    }

    #[test]
    fn max_key_fills_buy_quantity() {
        let (_dir, mut app) = app();
        app.load_random_symbol();
        press(&mut app, KeyCode::Char('r'));
        press(&mut app, KeyCode::Char('b'));
        press(&mut app, KeyCode::Char('m'));
        let InputMode::Quantity { ref buffer, .. } = app.input_mode else {
            panic!("expected quantity mode");
        };
        let filled: f64 = buffer.parse().unwrap();
        let expected = app.max_quantity(TradeSide::Buy).unwrap();
        assert!((filled - expected).abs() < 1e-3);
    }

    #[test]
    fn balance_entry_sets_ledger_balance() {
        let (_dir, mut app) = app();
        press(&mut app, KeyCode::Char('B'));
        type_str(&mut app, "25000");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.balance, 25_000.0);
        assert_eq!(app.ledger.balance(app.user_id).unwrap(), 25_000.0);
    }

    #[test]
    fn search_loads_exact_symbol() {
        let (_dir, mut app) = app();
        press(&mut app, KeyCode::Char('/'));
        type_str(&mut app, "btcusdt");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.last_symbol.as_deref(), Some("BTCUSDT"));
    }

    #[test]
    fn search_miss_falls_back_to_previous() {
        use replaylab_core::data::CsvBarProvider;
        use replaylab_core::domain::Market;

        let dir = tempfile::tempdir().unwrap();
        let market_dir = dir.path().join(Market::Crypto.label());
        std::fs::create_dir_all(&market_dir).unwrap();
        std::fs::write(
            market_dir.join("BTCUSDT_1h.csv"),
            "timestamp,open,high,low,close,volume\n\
             2024-01-02 10:00:00,10.0,11.0,9.5,10.5,1000\n\
             2024-01-02 11:00:00,10.5,12.0,10.0,11.5,1500\n",
        )
        .unwrap();
        let ledger =
            Arc::new(LedgerStore::open(&dir.path().join("ledger.db")).unwrap());
        let provider = Box::new(CsvBarProvider::new(dir.path()));
        let mut app =
            AppState::new(ledger, provider, dir.path().join("state.json"), 42).unwrap();

        app.load_symbol("BTCUSDT");
        press(&mut app, KeyCode::Char('/'));
        type_str(&mut app, "ZZZZZZ");
        press(&mut app, KeyCode::Enter);

        // The miss is recorded but the previous symbol stays on screen.
        assert_eq!(app.last_symbol.as_deref(), Some("BTCUSDT"));
        assert!(app.session.is_some());
        assert!(!app.error_history.is_empty());
    }

    #[test]
    fn help_overlay_swallows_next_key() {
        let (_dir, mut app) = app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.show_help);
        assert!(app.running); // the q only dismissed the overlay
    }

    #[test]
    fn portfolio_toggle_refreshes() {
        let (_dir, mut app) = app();
        app.load_random_symbol();
        press(&mut app, KeyCode::Char('r'));
        press(&mut app, KeyCode::Char('b'));
        type_str(&mut app, "1");
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Char('p'));
        assert!(app.show_portfolio);
        assert_eq!(app.portfolio.positions.len(), 1);
        assert_eq!(app.portfolio.recent.len(), 1);
    }
}
