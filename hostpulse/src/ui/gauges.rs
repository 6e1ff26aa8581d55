//! CPU / RAM / disk gauges for the latest sample.

use hostpulse::{types::clamp_pct, Sample};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Gauge},
};

use crate::ui::theme::{CPU_COLOR, DISK_COLOR, RAM_COLOR};
use crate::ui::util::fmt_gb;

fn gauge(f: &mut ratatui::Frame<'_>, area: Rect, title: &str, pct: f64, label: String, color: Color) {
    let g = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .gauge_style(Style::default().fg(color))
        .percent(clamp_pct(pct).round() as u16)
        .label(label);
    f.render_widget(g, area);
}

pub fn draw_gauges(f: &mut ratatui::Frame<'_>, area: Rect, s: Option<&Sample>) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let Some(s) = s else {
        for (i, title) in ["CPU", "RAM", "Disk"].into_iter().enumerate() {
            gauge(f, cols[i], title, 0.0, "--".into(), Color::DarkGray);
        }
        return;
    };

    gauge(
        f,
        cols[0],
        "CPU",
        s.cpu_percent,
        format!("{:.1}%", s.cpu_percent),
        CPU_COLOR,
    );
    gauge(
        f,
        cols[1],
        "RAM",
        s.ram.percent,
        format!(
            "{:.1}%  {} / {}  ({} free)",
            s.ram.percent,
            fmt_gb(s.ram.used_gb),
            fmt_gb(s.ram.total_gb),
            fmt_gb(s.ram.available_gb)
        ),
        RAM_COLOR,
    );
    gauge(
        f,
        cols[2],
        "Disk",
        s.disk.percent,
        format!(
            "{:.1}%  {} / {}  ({} free)",
            s.disk.percent,
            fmt_gb(s.disk.used_gb),
            fmt_gb(s.disk.total_gb),
            fmt_gb(s.disk.free_gb)
        ),
        DISK_COLOR,
    );
}
