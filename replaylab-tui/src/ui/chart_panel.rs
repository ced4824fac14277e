//! Candle chart panel — OHLC rendering with trade and signal overlays.
//!
//! Direct buffer writes:
//! - Each candle = 1 terminal column, the newest bars right-aligned
//! - Body: block char, positive color if close >= open
//! - Wicks: vertical line chars to high/low
//! - MA lines: dots in their configured color
//! - Trade markers: B/S at the snapped bar column, signal markers: triangles

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Widget};

use replaylab_core::chart::RenderPayload;

use crate::theme::{parse_hex, Theme};

pub struct ChartPanel<'a> {
    payload: &'a RenderPayload,
    theme: &'a Theme,
}

impl<'a> ChartPanel<'a> {
    pub fn new(payload: &'a RenderPayload, theme: &'a Theme) -> Self {
        Self { payload, theme }
    }

    /// Map a price to a Y position in the plot area (0 = top).
    fn price_to_y(price: f64, y_min: f64, y_max: f64, plot_height: u16) -> u16 {
        if (y_max - y_min).abs() < 1e-9 || plot_height == 0 {
            return 0;
        }
        let frac = (price - y_min) / (y_max - y_min);
        let y = plot_height.saturating_sub(1) as f64 * (1.0 - frac);
        y.round()
            .max(0.0)
            .min(plot_height.saturating_sub(1) as f64) as u16
    }
}

impl Widget for ChartPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let payload = self.payload;
        let bars = &payload.visible_bars;

        if bars.is_empty() {
            let block = Block::default()
                .title(format!(" {} [No Data] ", payload.symbol))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.muted))
                .style(Style::default().bg(self.theme.background));
            block.render(area, buf);
            return;
        }

        let stats = &payload.statistics;
        let title = format!(
            " {} {} | {} | {:.2} {:+.2}% ",
            payload.symbol,
            payload.timeframe.label(),
            payload.chart_kind.label(),
            stats.current_price,
            stats.pct_change,
        );
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent))
            .style(Style::default().bg(self.theme.background));
        let inner = block.inner(area);
        block.render(area, buf);

        // Left margin for Y-axis labels, one bottom row for the info line.
        let label_width: u16 = 9;
        let plot_left = inner.x + label_width;
        let plot_top = inner.y;
        let plot_width = inner.width.saturating_sub(label_width);
        let plot_height = inner.height.saturating_sub(1);
        if plot_width == 0 || plot_height == 0 {
            return;
        }

        // Newest bars right-aligned into the plot width.
        let drawn = bars.len().min(plot_width as usize);
        let start = bars.len() - drawn;
        let window = &bars[start..];

        // Price bounds from the drawn window; the renderer-owned viewport
        // y-range wins when the user has zoomed.
        let (y_lower, y_upper) = match payload.viewport.y_range {
            Some((lo, hi)) if hi > lo => (lo, hi),
            _ => {
                let y_min = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
                let y_max = window
                    .iter()
                    .map(|b| b.high)
                    .fold(f64::NEG_INFINITY, f64::max);
                let range = y_max - y_min;
                let pad = if range > 0.0 { range * 0.05 } else { 1.0 };
                (y_min - pad, y_max + pad)
            }
        };

        // Y-axis labels: top, middle, bottom.
        let y_labels = [y_upper, (y_upper + y_lower) / 2.0, y_lower];
        let y_positions = [0u16, plot_height / 2, plot_height.saturating_sub(1)];
        for (value, y_pos) in y_labels.iter().zip(y_positions.iter()) {
            let label = format!("{value:>8.2}");
            let y = plot_top + y_pos;
            if y < inner.y + inner.height {
                buf.set_string(inner.x, y, &label, Style::default().fg(self.theme.muted));
            }
        }

        // Candles.
        for (i, bar) in window.iter().enumerate() {
            let x = plot_left + i as u16;
            if x >= area.right() {
                break;
            }
            let is_up = bar.close >= bar.open;
            let color = if is_up {
                self.theme.positive
            } else {
                self.theme.negative
            };
            let style = Style::default().fg(color);

            let high_y = Self::price_to_y(bar.high, y_lower, y_upper, plot_height);
            let low_y = Self::price_to_y(bar.low, y_lower, y_upper, plot_height);
            let body_top = Self::price_to_y(bar.open.max(bar.close), y_lower, y_upper, plot_height);
            let body_bot = Self::price_to_y(bar.open.min(bar.close), y_lower, y_upper, plot_height);

            for y in high_y..body_top {
                buf.set_string(x, plot_top + y, "|", style);
            }
            let body_char = if is_up { "\u{2588}" } else { "\u{2593}" };
            for y in body_top..=body_bot {
                buf.set_string(x, plot_top + y, body_char, style);
            }
            for y in (body_bot + 1)..=low_y {
                buf.set_string(x, plot_top + y, "|", style);
            }
        }

        // MA lines as dots. Values are aligned 1:1 with the visible bars.
        for line in &payload.ma_lines {
            let color = parse_hex(&line.color, self.theme.neutral);
            let style = Style::default().fg(color);
            for (i, value) in line.values.iter().skip(start).enumerate() {
                if value.is_nan() || *value < y_lower || *value > y_upper {
                    continue;
                }
                let x = plot_left + i as u16;
                if x >= area.right() {
                    break;
                }
                let y = Self::price_to_y(*value, y_lower, y_upper, plot_height);
                buf.set_string(x, plot_top + y, "\u{00b7}", style);
            }
        }

        // Overlay markers sit on snapped bar timestamps, so a column lookup
        // by timestamp always resolves for visible markers.
        let column_of = |ts: chrono::NaiveDateTime| -> Option<u16> {
            window
                .iter()
                .position(|b| b.timestamp == ts)
                .map(|i| plot_left + i as u16)
        };

        for signal in &payload.overlay.indicator_markers {
            let Some(x) = column_of(signal.timestamp) else {
                continue;
            };
            let (glyph, color) = match signal.kind {
                replaylab_core::domain::SignalKind::Buy => ("\u{25b2}", self.theme.positive),
                replaylab_core::domain::SignalKind::Sell => ("\u{25bc}", self.theme.negative),
            };
            let y = Self::price_to_y(signal.price, y_lower, y_upper, plot_height);
            buf.set_string(x, plot_top + y, glyph, Style::default().fg(color));
        }

        for marker in &payload.overlay.trade_markers {
            let Some(x) = column_of(marker.timestamp) else {
                continue;
            };
            let (glyph, color) = match marker.side {
                replaylab_core::domain::TradeSide::Buy => ("B", self.theme.positive),
                replaylab_core::domain::TradeSide::Sell => ("S", self.theme.negative),
            };
            let y = Self::price_to_y(marker.price, y_lower, y_upper, plot_height);
            buf.set_string(
                x,
                plot_top + y,
                glyph,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            );
        }

        // Info line.
        let info_y = plot_top + plot_height;
        if info_y < area.bottom() {
            let info = format!(
                "{} bars | vol {:.0} | {} trades {} signals",
                bars.len(),
                stats.volume,
                payload.overlay.trade_markers.len(),
                payload.overlay.indicator_markers.len(),
            );
            buf.set_string(plot_left, info_y, &info, Style::default().fg(self.theme.muted));
        }
    }
}
