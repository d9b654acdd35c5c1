//! Parrot/neon theme tokens.
//!
//! Near-black background, electric cyan accent, neon green for gains and
//! breakouts, hot pink for losses and breakdowns.

use ratatui::style::{Color, Modifier, Style};

use indexwatch_core::Signal;

pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);
/// Current-price reference line.
pub const CURRENT: Color = Color::Rgb(80, 140, 255);

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

/// Gain/loss cells: strictly positive is green, zero or below is red.
pub fn change_style(value: f64) -> Style {
    if value > 0.0 {
        positive()
    } else {
        negative()
    }
}

pub fn signal_style(signal: Signal) -> Style {
    match signal {
        Signal::BullishBreakout => positive().add_modifier(Modifier::BOLD),
        Signal::BearishBreakdown => negative().add_modifier(Modifier::BOLD),
        Signal::None => muted(),
    }
}
