//! Per-instrument window charts, side by side.
//!
//! Each chart plots the close price over the selected window with three
//! reference lines: session high, session low, and current price. When the
//! last close of the window breaks out of the window's earlier range, the last
//! point gets a marker.

use chrono::{DateTime, Utc};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget};
use ratatui::Frame;

use indexwatch_core::{breakout_signal, tail_window, Instrument, Sample, Signal, Summary};

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState, now: DateTime<Utc>) {
    let instruments = &app.config.instruments;
    if instruments.is_empty() {
        return;
    }
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, instruments.len() as u32); instruments.len()])
        .split(area);

    let blocks = app.effective_blocks(now);
    for (inst, &column) in instruments.iter().zip(columns.iter()) {
        let snapshot = app.snapshot.as_ref();
        let window = snapshot
            .and_then(|s| s.series_for(inst))
            .map(|series| tail_window(series, blocks))
            .unwrap_or(&[]);
        let summary = snapshot.and_then(|s| s.table.get(inst));
        f.render_widget(InstrumentChart::new(inst, window, summary), column);
    }
}

/// Chart widget for one instrument.
pub struct InstrumentChart<'a> {
    instrument: &'a Instrument,
    window: &'a [Sample],
    summary: Option<&'a Summary>,
}

impl<'a> InstrumentChart<'a> {
    pub fn new(instrument: &'a Instrument, window: &'a [Sample], summary: Option<&'a Summary>) -> Self {
        Self { instrument, window, summary }
    }

    /// Marker for the last point, computed over the window only.
    pub fn signal(&self) -> Signal {
        breakout_signal(self.window)
    }
}

impl Widget for InstrumentChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).border_style(theme::muted());

        let (Some(summary), Some(last)) = (self.summary, self.window.last()) else {
            let block = block
                .title(format!(" {} ", self.instrument.name))
                .title_style(theme::accent_bold());
            let inner = block.inner(area);
            block.render(area, buf);
            Paragraph::new(Span::styled("No intraday data", theme::muted())).render(inner, buf);
            return;
        };

        let closes: Vec<(f64, f64)> =
            self.window.iter().enumerate().map(|(i, s)| (i as f64, s.close)).collect();
        let x_max = (self.window.len().saturating_sub(1) as f64).max(1.0);

        let hline = |y: f64| vec![(0.0, y), (x_max, y)];
        let high_line = hline(summary.high);
        let low_line = hline(summary.low);
        let current_line = hline(summary.current);
        let last_point = [(closes.len().saturating_sub(1) as f64, last.close)];

        let mut datasets = vec![
            Dataset::default()
                .name("Close")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(theme::accent())
                .data(&closes),
            Dataset::default()
                .name(format!("Day High {:.2}", summary.high))
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Line)
                .style(theme::positive())
                .data(&high_line),
            Dataset::default()
                .name(format!("Day Low {:.2}", summary.low))
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Line)
                .style(theme::negative())
                .data(&low_line),
            Dataset::default()
                .name(format!("Current {:.2}", summary.current))
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(theme::CURRENT))
                .data(&current_line),
        ];

        let marker = match self.signal() {
            Signal::BullishBreakout => Some(("▲ Breakout", theme::positive())),
            Signal::BearishBreakdown => Some(("▼ Breakdown", theme::negative())),
            Signal::None => None,
        };
        if let Some((label, style)) = marker {
            datasets.push(
                Dataset::default()
                    .name(label)
                    .marker(symbols::Marker::Block)
                    .graph_type(GraphType::Scatter)
                    .style(style.add_modifier(Modifier::BOLD))
                    .data(&last_point),
            );
        }

        // Bounds cover the window and all three reference lines.
        let y_min = closes.iter().map(|&(_, y)| y).fold(summary.low, f64::min);
        let y_max = closes.iter().map(|&(_, y)| y).fold(summary.high, f64::max);
        let y_range = y_max - y_min;
        let y_pad = if y_range > 0.0 { y_range * 0.05 } else { 1.0 };
        let (y_lower, y_upper) = (y_min - y_pad, y_max + y_pad);

        let time = |s: Option<&Sample>| s.map(|s| s.timestamp.format("%H:%M").to_string()).unwrap_or_default();
        let x_labels = vec![
            Span::styled(time(self.window.first()), theme::muted()),
            Span::styled(time(Some(last)), theme::muted()),
        ];
        let y_labels = vec![
            Span::styled(format!("{y_lower:.0}"), theme::muted()),
            Span::styled(format!("{y_upper:.0}"), theme::muted()),
        ];

        let title = Line::from(vec![
            Span::styled(format!(" {} ", self.instrument.name), theme::accent_bold()),
            Span::styled(format!("{} pts ", self.window.len()), theme::muted()),
        ]);

        Chart::new(datasets)
            .block(block.title(title))
            .x_axis(
                Axis::default()
                    .style(theme::muted())
                    .bounds([0.0, x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .style(theme::muted())
                    .bounds([y_lower, y_upper])
                    .labels(y_labels),
            )
            .hidden_legend_constraints((Constraint::Ratio(1, 1), Constraint::Ratio(1, 1)))
            .render(area, buf);
    }
}
