//! Neon theme tokens for the ReplayLab TUI.
//!
//! Palette:
//! - **Background**: near-black charcoal
//! - **Accent**: electric cyan (focus, borders)
//! - **Positive**: neon green (up candles, buys, gains)
//! - **Negative**: hot pink (down candles, sells, losses)
//! - **Warning**: neon orange (alerts)
//! - **Muted**: steel blue (axis labels, secondary text)

use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub accent: Color,
    pub positive: Color,
    pub negative: Color,
    pub warning: Color,
    pub neutral: Color,
    pub muted: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::neon()
    }
}

impl Theme {
    pub fn neon() -> Self {
        Self {
            background: Color::Rgb(18, 18, 20),
            accent: Color::Rgb(0, 255, 255),
            positive: Color::Rgb(0, 255, 128),
            negative: Color::Rgb(255, 20, 147),
            warning: Color::Rgb(255, 140, 0),
            neutral: Color::Rgb(147, 112, 219),
            muted: Color::Rgb(100, 149, 237),
            text_primary: Color::White,
            text_secondary: Color::Rgb(170, 170, 170),
        }
    }

    /// Color for a P&L or percent-change value.
    pub fn pnl_color(&self, value: f64) -> Color {
        if value >= 0.0 {
            self.positive
        } else {
            self.negative
        }
    }

    /// Color for a trade side label.
    pub fn side_color(&self, side: replaylab_core::domain::TradeSide) -> Color {
        match side {
            replaylab_core::domain::TradeSide::Buy => self.positive,
            replaylab_core::domain::TradeSide::Sell => self.negative,
        }
    }
}

/// Parse a `#rrggbb` hint from a moving-average spec. Falls back to `default`
/// on anything malformed.
pub fn parse_hex(hint: &str, default: Color) -> Color {
    let hex = match hint.strip_prefix('#') {
        Some(h) if h.len() == 6 => h,
        _ => return default,
    };
    let parse = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16);
    match (parse(0..2), parse(2..4), parse(4..6)) {
        (Ok(r), Ok(g), Ok(b)) => Color::Rgb(r, g, b),
        _ => default,
    }
}
