//! Title line and session line: last update, market state, window size.

use chrono::{DateTime, Utc};
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState, now: DateTime<Utc>) {
    let session = &app.config.session;

    let updated = match &app.snapshot {
        Some(snapshot) => snapshot
            .taken_at
            .with_timezone(&session.timezone)
            .format("%H:%M:%S")
            .to_string(),
        None => "--:--:--".to_string(),
    };

    let mut title = vec![
        Span::styled(" Index Dashboard ", theme::accent_bold()),
        Span::styled(format!("[{}]", app.source_name), theme::muted()),
        Span::raw("  "),
        Span::styled(format!("Last updated {updated} ({})", session.timezone), theme::muted()),
    ];
    if app.refresh_in_flight {
        title.push(Span::styled("  refreshing", theme::warning()));
    }
    if app.table_changed {
        title.push(Span::styled("  changed", theme::accent()));
    }

    let (state, state_style) = if session.is_open(now) {
        ("OPEN", theme::positive())
    } else {
        ("CLOSED", theme::negative())
    };
    let blocks = app.effective_blocks(now);
    let minutes = blocks as u32 * session.interval_minutes;
    let info = vec![
        Span::styled(format!(" Market {state}"), state_style),
        Span::styled(
            format!(
                "  {} / {} min elapsed",
                session.minutes_elapsed(now),
                session.length_minutes()
            ),
            theme::muted(),
        ),
        Span::styled(format!("  Last {minutes} minutes"), theme::accent()),
        Span::styled(
            format!(" ({blocks}/{} blocks, +/- to change)", session.max_blocks(now)),
            theme::muted(),
        ),
    ];

    f.render_widget(Paragraph::new(vec![Line::from(title), Line::from(info)]), area);
}
