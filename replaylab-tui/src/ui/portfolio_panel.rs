//! Portfolio panel — cash, open positions, recent transactions.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Widget};

use crate::app::PortfolioView;
use crate::theme::Theme;

pub struct PortfolioPanel<'a> {
    portfolio: &'a PortfolioView,
    balance: f64,
    theme: &'a Theme,
}

impl<'a> PortfolioPanel<'a> {
    pub fn new(portfolio: &'a PortfolioView, balance: f64, theme: &'a Theme) -> Self {
        Self {
            portfolio,
            balance,
            theme,
        }
    }
}

impl Widget for PortfolioPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Portfolio ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent))
            .style(Style::default().bg(self.theme.background));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let mut y = inner.y;
        let mut put = |buf: &mut Buffer, y: &mut u16, text: &str, style: Style| {
            if *y >= inner.bottom() {
                return;
            }
            let clipped: String = text.chars().take(inner.width as usize).collect();
            buf.set_string(inner.x, *y, &clipped, style);
            *y += 1;
        };

        put(
            buf,
            &mut y,
            &format!("Cash  {:>12.2}", self.balance),
            Style::default()
                .fg(self.theme.text_primary)
                .add_modifier(Modifier::BOLD),
        );
        put(buf, &mut y, "", Style::default());

        put(
            buf,
            &mut y,
            "Positions",
            Style::default().fg(self.theme.accent),
        );
        if self.portfolio.positions.is_empty() {
            put(
                buf,
                &mut y,
                "  (flat)",
                Style::default().fg(self.theme.muted),
            );
        }
        for pos in &self.portfolio.positions {
            let line = format!(
                "  {:<10} {:>9.4} @ {:>9.2}  cost {:>10.2}",
                pos.symbol, pos.quantity, pos.avg_price, pos.total_cost,
            );
            put(buf, &mut y, &line, Style::default().fg(self.theme.text_primary));
        }
        put(buf, &mut y, "", Style::default());

        put(
            buf,
            &mut y,
            "Recent trades",
            Style::default().fg(self.theme.accent),
        );
        if self.portfolio.recent.is_empty() {
            put(
                buf,
                &mut y,
                "  (none)",
                Style::default().fg(self.theme.muted),
            );
        }
        for txn in &self.portfolio.recent {
            let line = format!(
                "  {} {:<4} {:<10} {:>8.4} @ {:>9.2} {:>+9.2}",
                txn.chart_timestamp.format("%m-%d %H:%M"),
                txn.side.label(),
                txn.symbol,
                txn.quantity,
                txn.price,
                txn.profit_loss,
            );
            let color = self.theme.side_color(txn.side);
            put(buf, &mut y, &line, Style::default().fg(color));
        }
    }
}
