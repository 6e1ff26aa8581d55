//! View coordinator: the one owner of "what should be on screen".
//!
//! Every input (transport callbacks, retrieval completions, operator
//! commands) arrives as a [`ViewEvent`] and goes through [`ViewCoordinator::dispatch`],
//! one at a time. Dispatch never blocks; when a transition needs a historical
//! load it hands back a [`HistoryRequest`] for the caller to run.

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::history::{RequestToken, RequestTracker};
use crate::types::{
    derive, top_processes, ChartPoint, ProcessEntry, Sample, TimeRange, ViewMode, TOP_PROCESS_LIMIT,
};
use crate::window::{LiveWindow, LIVE_WINDOW_CAPACITY};
use crate::ws::{ConnectionState, TransportEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// The transport started a (re)connect attempt.
    TransportConnecting,
    TransportOpened,
    TransportSample(Sample),
    TransportClosed,
    TransportError(String),
    /// Reading from the current-snapshot endpoint while the push channel is down.
    FallbackSample(Sample),
    SetViewMode(ViewMode),
    SetTimeRange(TimeRange),
    HistoricalResult {
        token: RequestToken,
        result: Result<Vec<Sample>, String>,
    },
}

impl From<TransportEvent> for ViewEvent {
    fn from(ev: TransportEvent) -> Self {
        match ev {
            TransportEvent::Connecting => ViewEvent::TransportConnecting,
            TransportEvent::Opened => ViewEvent::TransportOpened,
            TransportEvent::Sample(s) => ViewEvent::TransportSample(s),
            TransportEvent::Error(e) => ViewEvent::TransportError(e),
            TransportEvent::Closed => ViewEvent::TransportClosed,
        }
    }
}

/// A historical load the caller must start on the coordinator's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRequest {
    pub token: RequestToken,
    pub range: TimeRange,
}

/// Read-only copy of the coordinator state handed to the presentation.
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    pub connected: bool,
    pub connection: ConnectionState,
    pub last_update: Option<DateTime<Local>>,
    pub current: Option<Sample>,
    pub series: Vec<ChartPoint>,
    pub top_processes: Vec<ProcessEntry>,
    pub mode: ViewMode,
    pub range: TimeRange,
    pub loading_history: bool,
    /// Size of the real-time window.
    pub window_capacity: usize,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct ViewCoordinator {
    connection: ConnectionState,
    mode: ViewMode,
    range: TimeRange,
    window: LiveWindow,
    series: Vec<ChartPoint>,
    current: Option<Sample>,
    last_update: Option<DateTime<Local>>,
    last_error: Option<String>,
    requests: RequestTracker,
    // None keeps the historical tail growing without bound.
    history_cap: Option<usize>,
}

impl ViewCoordinator {
    pub fn new(window_capacity: usize, history_cap: Option<usize>) -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            mode: ViewMode::RealTime,
            range: TimeRange::default(),
            window: LiveWindow::new(window_capacity),
            series: Vec::new(),
            current: None,
            last_update: None,
            last_error: None,
            requests: RequestTracker::default(),
            history_cap,
        }
    }

    pub fn dispatch(&mut self, event: ViewEvent) -> Option<HistoryRequest> {
        match event {
            ViewEvent::TransportConnecting => {
                self.connection = ConnectionState::Connecting;
                None
            }
            ViewEvent::TransportOpened => {
                info!("push channel connected");
                self.connection = ConnectionState::Connected;
                self.last_error = None;
                None
            }
            ViewEvent::TransportSample(s) => {
                self.apply_sample(s);
                None
            }
            ViewEvent::FallbackSample(s) => {
                // A poll may resolve after the push channel came back.
                let newer = self
                    .current
                    .as_ref()
                    .map_or(true, |cur| s.timestamp > cur.timestamp);
                if self.connection != ConnectionState::Connected && newer {
                    self.apply_sample(s);
                } else {
                    debug!(ts = %s.timestamp, "dropping late fallback sample");
                }
                None
            }
            ViewEvent::TransportClosed => {
                self.connection = ConnectionState::ReconnectPending;
                None
            }
            ViewEvent::TransportError(e) => {
                // The manager retries after every error; only close() ends it.
                self.connection = ConnectionState::ReconnectPending;
                self.last_error = Some(e);
                None
            }
            ViewEvent::SetViewMode(ViewMode::RealTime) => {
                self.mode = ViewMode::RealTime;
                self.requests.invalidate();
                self.window.clear();
                self.series.clear();
                None
            }
            ViewEvent::SetViewMode(ViewMode::Historical) => {
                self.mode = ViewMode::Historical;
                Some(self.request_history())
            }
            ViewEvent::SetTimeRange(range) => {
                self.range = range;
                match self.mode {
                    ViewMode::Historical => Some(self.request_history()),
                    ViewMode::RealTime => None,
                }
            }
            ViewEvent::HistoricalResult { token, result } => {
                self.apply_history(token, result);
                None
            }
        }
    }

    fn request_history(&mut self) -> HistoryRequest {
        let token = self.requests.issue();
        debug!(?token, days = self.range.days(), "history requested");
        HistoryRequest {
            token,
            range: self.range,
        }
    }

    fn apply_sample(&mut self, s: Sample) {
        match self.mode {
            ViewMode::RealTime => {
                self.window.push(&s);
                self.series = self.window.snapshot();
            }
            ViewMode::Historical => {
                self.series.push(derive(&s));
                if let Some(cap) = self.history_cap {
                    let excess = self.series.len().saturating_sub(cap.max(1));
                    self.series.drain(..excess);
                }
            }
        }
        self.current = Some(s);
        self.last_update = Some(Local::now());
    }

    fn apply_history(&mut self, token: RequestToken, result: Result<Vec<Sample>, String>) {
        if !self.requests.settle(token) {
            debug!(?token, "dropping stale history result");
            return;
        }
        match result {
            Ok(samples) => {
                info!(points = samples.len(), "history loaded");
                self.series = samples.iter().map(derive).collect();
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(e),
        }
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn series(&self) -> &[ChartPoint] {
        &self.series
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            connected: self.connection == ConnectionState::Connected,
            connection: self.connection,
            last_update: self.last_update,
            current: self.current.clone(),
            series: self.series.clone(),
            top_processes: self
                .current
                .as_ref()
                .map(|s| top_processes(s, TOP_PROCESS_LIMIT))
                .unwrap_or_default(),
            mode: self.mode,
            range: self.range,
            loading_history: self.requests.pending().is_some(),
            window_capacity: self.window.capacity(),
            last_error: self.last_error.clone(),
        }
    }
}

impl Default for ViewCoordinator {
    fn default() -> Self {
        Self::new(LIVE_WINDOW_CAPACITY, None)
    }
}
