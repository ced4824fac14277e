//! Frame layout — chart, optional portfolio split, status bar, help overlay.

mod chart_panel;
mod portfolio_panel;
mod status_bar;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::app::AppState;
use crate::theme::Theme;

pub use chart_panel::ChartPanel;
pub use portfolio_panel::PortfolioPanel;

pub fn draw(f: &mut Frame, app: &AppState) {
    let theme = Theme::default();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(2)])
        .split(f.area());

    let main = rows[0];
    if app.show_portfolio {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
            .split(main);
        draw_chart(f, app, &theme, cols[0]);
        f.render_widget(
            PortfolioPanel::new(&app.portfolio, app.balance, &theme),
            cols[1],
        );
    } else {
        draw_chart(f, app, &theme, main);
    }

    status_bar::draw(f, app, &theme, rows[1]);

    if app.show_help {
        draw_help(f, &theme);
    }
}

fn draw_chart(f: &mut Frame, app: &AppState, theme: &Theme, area: Rect) {
    match app.payload.as_ref() {
        Some(payload) => f.render_widget(ChartPanel::new(payload, theme), area),
        None => {
            let block = Block::default()
                .title(" ReplayLab — press y for a random symbol ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.muted))
                .style(Style::default().bg(theme.background));
            f.render_widget(block, area);
        }
    }
}

const HELP_LINES: &[&str] = &[
    "r        jump to a random point in history",
    "n / →    reveal next bar",
    "N        reveal 5 bars",
    "a        reveal whole series (drop cutoff)",
    "",
    "b / s    buy / sell (enter quantity, m = max)",
    "B        set account balance",
    "",
    "c        toggle Candles / Heikin-Ashi",
    "i        toggle MA-cross signals",
    "o / O    add / remove moving average",
    "",
    "Tab      next market",
    "t        next timeframe",
    "y        random symbol",
    "/        search symbol",
    "p        portfolio panel",
    "",
    "q        quit      ?  this help",
];

fn draw_help(f: &mut Frame, theme: &Theme) {
    let area = centered_rect(46, HELP_LINES.len() as u16 + 2, f.area());
    let lines: Vec<Line> = HELP_LINES.iter().map(|l| Line::from(*l)).collect();
    let paragraph = Paragraph::new(lines)
        .style(
            Style::default()
                .fg(theme.text_primary)
                .bg(theme.background),
        )
        .block(
            Block::default()
                .title(" Keys ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent)),
        );
    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn centered_rect(width: u16, height: u16, outer: Rect) -> Rect {
    let width = width.min(outer.width);
    let height = height.min(outer.height);
    Rect {
        x: outer.x + (outer.width - width) / 2,
        y: outer.y + (outer.height - height) / 2,
        width,
        height,
    }
}
