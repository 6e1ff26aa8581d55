//! Top header: connection status, last update, view mode and any error.

use hostpulse::{ConnectionState, ViewMode, ViewSnapshot};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::ui::theme::{DOWN_COLOR, LIVE_COLOR, MUTED};

pub fn status_text(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Connected => "Live",
        ConnectionState::Connecting => "Connecting",
        ConnectionState::ReconnectPending => "Reconnecting",
        ConnectionState::Disconnected => "Disconnected",
    }
}

pub fn draw_header(f: &mut ratatui::Frame<'_>, area: Rect, snap: &ViewSnapshot) {
    let dot = if snap.connected { LIVE_COLOR } else { DOWN_COLOR };
    let updated = snap
        .last_update
        .map(|t| format!("last update {}", t.format("%H:%M:%S")))
        .unwrap_or_else(|| "waiting for data".into());
    let mode = match snap.mode {
        ViewMode::RealTime => format!("Real-time (last {} samples)", snap.window_capacity),
        ViewMode::Historical => format!("Historical ({} days)", snap.range.days()),
    };

    let status = Line::from(vec![
        Span::styled("● ", Style::default().fg(dot)),
        Span::styled(
            status_text(snap.connection),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  |  {updated}  |  {mode}")),
    ]);

    let detail = if let Some(err) = snap.last_error.as_deref() {
        Line::from(Span::styled(err.to_string(), Style::default().fg(Color::Red)))
    } else if snap.loading_history {
        Line::from(Span::styled(
            "loading history...",
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(Span::styled(
            "r real-time  h historical  1/2/3 7/15/30 days  q quit",
            Style::default().fg(MUTED),
        ))
    };

    let block = Block::default().title("hostpulse").borders(Borders::BOTTOM);
    f.render_widget(Paragraph::new(vec![status, detail]).block(block), area);
}
