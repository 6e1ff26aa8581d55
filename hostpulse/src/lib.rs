//! Client-side metrics synchronization for hostpulse: push transport,
//! historical retrieval, live window, and the view coordinator that
//! reconciles them.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod history;
pub mod profiles;
pub mod types;
pub mod window;
pub mod ws;

pub use coordinator::{HistoryRequest, ViewCoordinator, ViewEvent, ViewSnapshot};
pub use types::{ChartPoint, ProcessEntry, Sample, TimeRange, ViewMode};
pub use ws::{ConnectionState, TransportEvent, TransportManager};
