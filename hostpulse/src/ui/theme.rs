//! Shared UI theme constants.

use ratatui::style::Color;

// Series colors, shared by the gauges and the chart legend.
pub const CPU_COLOR: Color = Color::Rgb(59, 130, 246);
pub const RAM_COLOR: Color = Color::Rgb(16, 185, 129);
pub const DISK_COLOR: Color = Color::Rgb(245, 158, 11);

pub const LIVE_COLOR: Color = Color::Green;
pub const DOWN_COLOR: Color = Color::Red;
pub const MUTED: Color = Color::DarkGray;
