//! Top-level UI layout: header, summary table, per-instrument charts, status bar.

pub mod chart_panel;
pub mod header;
pub mod overlays;
pub mod status_bar;
pub mod table_panel;

use chrono::{DateTime, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;

use crate::app::{AppState, Overlay};

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    draw_at(f, app, Utc::now());
}

/// Draw against the session clock at `now`.
pub fn draw_at(f: &mut Frame, app: &AppState, now: DateTime<Utc>) {
    // Table height: header row + one row per instrument + borders.
    let table_height = app.config.instruments.len() as u16 + 3;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(table_height),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(f.area());

    header::render(f, chunks[0], app, now);
    table_panel::render(f, chunks[1], app);
    chart_panel::render(f, chunks[2], app, now);
    status_bar::render(f, chunks[3], app);

    match app.overlay {
        Overlay::Help => overlays::render_help(f, chunks[2]),
        Overlay::ErrorHistory => overlays::render_error_history(f, f.area(), app),
        Overlay::None => {}
    }
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
