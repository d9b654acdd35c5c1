//! Summary table: one row per configured instrument.

use ratatui::layout::{Constraint, Rect};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use indexwatch_core::{Instrument, Summary};

use crate::app::AppState;
use crate::theme;

const HEADERS: [&str; 10] =
    ["Index", "Open", "High", "Low", "Current", "Gain", "% Gain", "Loss", "% Loss", "Signal"];

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(" Intraday Summary ")
        .title_style(theme::accent_bold());

    let table = app.snapshot.as_ref().map(|s| &s.table).filter(|t| !t.is_empty());
    let Some(table) = table else {
        let inner = block.inner(area);
        f.render_widget(block, area);
        f.render_widget(Paragraph::new(Span::styled("No data available yet", theme::warning())), inner);
        return;
    };

    let header = Row::new(HEADERS.iter().map(|h| Cell::from(*h).style(theme::accent_bold())));
    let rows: Vec<Row> = app
        .config
        .instruments
        .iter()
        .map(|inst| match table.get(inst) {
            Some(summary) => summary_row(inst, summary),
            None => placeholder_row(inst),
        })
        .collect();

    let widths = [
        Constraint::Min(18),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(18),
    ];
    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

fn summary_row<'a>(inst: &Instrument, s: &Summary) -> Row<'a> {
    Row::new(vec![
        Cell::from(inst.name.clone()),
        Cell::from(fmt_price(s.open)),
        Cell::from(fmt_price(s.high)),
        Cell::from(fmt_price(s.low)),
        Cell::from(fmt_price(s.current)),
        Cell::from(fmt_price(s.gain)).style(theme::change_style(s.gain)),
        Cell::from(fmt_pct(s.pct_gain)).style(pct_style(s.pct_gain)),
        Cell::from(fmt_price(s.loss)).style(theme::change_style(s.loss)),
        Cell::from(fmt_pct(s.pct_loss)).style(pct_style(s.pct_loss)),
        Cell::from(s.signal.label()).style(theme::signal_style(s.signal)),
    ])
}

fn placeholder_row<'a>(inst: &Instrument) -> Row<'a> {
    let mut cells = vec![Cell::from(inst.name.clone())];
    cells.extend((0..8).map(|_| Cell::from("—")));
    cells.push(Cell::from("no data yet"));
    Row::new(cells).style(theme::muted())
}

pub fn fmt_price(value: f64) -> String {
    format!("{value:.2}")
}

/// Undefined percentages (zero open) render as a dash.
pub fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}%"),
        None => "—".to_string(),
    }
}

fn pct_style(value: Option<f64>) -> ratatui::style::Style {
    value.map_or_else(theme::muted, theme::change_style)
}
