//! Two-line status bar: message/prompt line plus key hints.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::Frame;

use crate::app::{AppState, InputMode, StatusLevel};
use crate::theme::Theme;

const KEY_HINTS: &str =
    "q quit | r jump | n/N step | b/s trade | B balance | c chart | i signals | o/O ma | Tab market | t tf | y random | / search | p portfolio | ? help";

pub fn draw(f: &mut Frame, app: &AppState, theme: &Theme, area: Rect) {
    if area.height == 0 {
        return;
    }
    let buf = f.buffer_mut();

    // Line 1: modal prompt when entering text, status message otherwise,
    // with the cash balance pinned to the right.
    let (line, style) = match &app.input_mode {
        InputMode::Quantity { side, buffer } => (
            format!("{} quantity (m = max): {buffer}_", side.label()),
            Style::default()
                .fg(theme.side_color(*side))
                .add_modifier(Modifier::BOLD),
        ),
        InputMode::Balance { buffer } => (
            format!("new balance: {buffer}_"),
            Style::default()
                .fg(theme.warning)
                .add_modifier(Modifier::BOLD),
        ),
        InputMode::Search { buffer } => (
            format!("symbol: {buffer}_"),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        InputMode::Normal => match &app.status_message {
            Some((msg, level)) => {
                let color = match level {
                    StatusLevel::Info => theme.text_secondary,
                    StatusLevel::Warning => theme.warning,
                    StatusLevel::Error => theme.negative,
                };
                (msg.clone(), Style::default().fg(color))
            }
            None => (String::new(), Style::default()),
        },
    };
    buf.set_string(area.x, area.y, &line, style);

    let balance = format!("cash {:.2}", app.balance);
    if (balance.len() as u16) < area.width {
        buf.set_string(
            area.x + area.width - balance.len() as u16,
            area.y,
            &balance,
            Style::default().fg(theme.positive),
        );
    }

    // Line 2: key hints.
    if area.height > 1 {
        buf.set_string(
            area.x,
            area.y + 1,
            KEY_HINTS,
            Style::default().fg(theme.muted),
        );
    }
}
