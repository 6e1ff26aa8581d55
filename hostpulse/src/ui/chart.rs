//! CPU / RAM / disk line chart over the display series.

use hostpulse::{types::clamp_pct, ChartPoint, ViewMode, ViewSnapshot};
use ratatui::{
    layout::Rect,
    style::Style,
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
};

use crate::ui::theme::{CPU_COLOR, DISK_COLOR, MUTED, RAM_COLOR};

/// Index-based x axis: historical rows are irregularly spaced and the chart
/// only needs their order.
fn points(series: &[ChartPoint], pick: impl Fn(&ChartPoint) -> f64) -> Vec<(f64, f64)> {
    series
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, clamp_pct(pick(p))))
        .collect()
}

fn axis_label(p: &ChartPoint, mode: ViewMode) -> String {
    match mode {
        ViewMode::RealTime => p.label.clone(),
        ViewMode::Historical => p
            .time
            .with_timezone(&chrono::Local)
            .format("%m-%d %H:%M")
            .to_string(),
    }
}

pub fn draw_series(f: &mut ratatui::Frame<'_>, area: Rect, snap: &ViewSnapshot) {
    let series = &snap.series;
    let cpu = points(series, |p| p.cpu);
    let ram = points(series, |p| p.ram);
    let disk = points(series, |p| p.disk);

    let datasets = vec![
        Dataset::default()
            .name("CPU")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(CPU_COLOR))
            .data(&cpu),
        Dataset::default()
            .name("RAM")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(RAM_COLOR))
            .data(&ram),
        Dataset::default()
            .name("Disk")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(DISK_COLOR))
            .data(&disk),
    ];

    let title = match snap.mode {
        ViewMode::RealTime => format!("Real-time metrics ({} points)", series.len()),
        ViewMode::Historical => format!(
            "Last {} days ({} points)",
            snap.range.days(),
            series.len()
        ),
    };

    let x_labels: Vec<Span> = match (series.first(), series.last()) {
        (Some(a), Some(b)) => vec![
            Span::styled(axis_label(a, snap.mode), Style::default().fg(MUTED)),
            Span::styled(axis_label(b, snap.mode), Style::default().fg(MUTED)),
        ],
        _ => Vec::new(),
    };

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(
            Axis::default()
                .bounds([0.0, series.len().saturating_sub(1).max(1) as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, 100.0])
                .labels(vec![Span::raw("0"), Span::raw("50"), Span::raw("100")]),
        );
    f.render_widget(chart, area);
}
