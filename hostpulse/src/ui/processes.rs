//! Top processes table (busiest first) with per-cell coloring.

use hostpulse::{types::clamp_pct, ProcessEntry};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table},
};

use crate::ui::util::{fmt_mb, fmt_pct, truncate_middle};

const COLS: [Constraint; 4] = [
    Constraint::Length(8),  // PID
    Constraint::Min(16),    // Name
    Constraint::Length(8),  // CPU %
    Constraint::Length(10), // Mem
];

fn cpu_color(v: f64) -> Color {
    match v {
        x if x < 25.0 => Color::Green,
        x if x < 60.0 => Color::Yellow,
        _ => Color::Red,
    }
}

pub fn draw_top_processes(f: &mut ratatui::Frame<'_>, area: Rect, procs: &[ProcessEntry]) {
    let name_width = area.width.saturating_sub(8 + 8 + 10 + 5).max(8) as usize;
    let peak_cpu = procs.iter().map(|p| p.cpu_percent).fold(0.0_f64, f64::max);

    let rows = procs.iter().enumerate().map(|(i, p)| {
        let mut style = if i % 2 == 1 {
            Style::default().bg(Color::Rgb(30, 30, 36))
        } else {
            Style::default()
        };
        if p.cpu_percent > 0.0 && (p.cpu_percent - peak_cpu).abs() < f64::EPSILON {
            style = style.add_modifier(Modifier::BOLD);
        }
        Row::new(vec![
            Cell::from(p.pid.to_string()).style(Style::default().fg(Color::DarkGray)),
            Cell::from(truncate_middle(&p.name, name_width)),
            Cell::from(fmt_pct(clamp_pct(p.cpu_percent))).style(Style::default().fg(cpu_color(p.cpu_percent))),
            Cell::from(fmt_mb(p.memory_mb)),
        ])
        .style(style)
    });

    let header = Row::new(vec!["PID", "Name", "CPU %", "Mem"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let table = Table::new(rows, COLS)
        .header(header)
        .column_spacing(1)
        .block(Block::default().borders(Borders::ALL).title("Top Processes"));
    f.render_widget(table, area);
}
