//! UI module root: lays out the panels and draws one coordinator snapshot.
//! Nothing here mutates view state.

pub mod chart;
pub mod gauges;
pub mod header;
pub mod processes;
pub mod theme;
pub mod util;

use hostpulse::ViewSnapshot;
use ratatui::layout::{Constraint, Direction, Layout};

pub fn draw(f: &mut ratatui::Frame<'_>, snap: &ViewSnapshot) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // header + status line
            Constraint::Length(4),  // cpu / ram / disk gauges
            Constraint::Min(10),    // chart
            Constraint::Length(13), // top processes
        ])
        .split(f.area());

    header::draw_header(f, rows[0], snap);
    gauges::draw_gauges(f, rows[1], snap.current.as_ref());
    chart::draw_series(f, rows[2], snap);
    processes::draw_top_processes(f, rows[3], &snap.top_processes);
}
