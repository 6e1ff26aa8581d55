//! Types that mirror the metrics server's JSON schema, plus the client-side
//! shapes derived from them.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SampleError;

/// Number of process rows the presentation shows.
pub const TOP_PROCESS_LIMIT: usize = 10;

// Epoch values above this are taken to be milliseconds (JS Date.now()).
const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RamUsage {
    pub percent: f64,
    pub used_gb: f64,
    pub total_gb: f64,
    pub available_gb: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub percent: f64,
    pub used_gb: f64,
    pub total_gb: f64,
    pub free_gb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_mb: f64,
}

/// One point-in-time reading. Values are stored exactly as received;
/// clamping happens only when drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: f64,
    pub ram: RamUsage,
    pub disk: DiskUsage,
    pub top_processes: Vec<ProcessEntry>,
}

/// Projection of a Sample onto the three chart series.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub time: DateTime<Utc>,
    pub label: String,
    pub cpu: f64,
    pub ram: f64,
    pub disk: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    RealTime,
    Historical,
}

/// Look-back window for the historical view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    Week,
    HalfMonth,
    Month,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [TimeRange::Week, TimeRange::HalfMonth, TimeRange::Month];

    pub fn days(self) -> u32 {
        match self {
            TimeRange::Week => 7,
            TimeRange::HalfMonth => 15,
            TimeRange::Month => 30,
        }
    }

    /// Look-back window in minutes, as the history endpoint expects it.
    pub fn minutes(self) -> u32 {
        self.days() * 24 * 60
    }
}

// ---------- Wire shapes ----------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireTimestamp {
    Epoch(f64),
    Text(String),
}

impl WireTimestamp {
    pub(crate) fn resolve(&self) -> Result<DateTime<Utc>, SampleError> {
        match self {
            WireTimestamp::Epoch(v) => {
                let millis = if v.abs() >= EPOCH_MILLIS_THRESHOLD {
                    *v
                } else {
                    v * 1000.0
                };
                Utc.timestamp_millis_opt(millis as i64)
                    .single()
                    .ok_or_else(|| SampleError::Timestamp(v.to_string()))
            }
            WireTimestamp::Text(s) => parse_timestamp(s),
        }
    }
}

/// Accepts RFC 3339 and the offset-less ISO form the server emits for stored
/// rows (treated as UTC).
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, SampleError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|_| SampleError::Timestamp(s.to_string()))
}

#[derive(Debug, Deserialize)]
struct CpuReading {
    percent: f64,
}

/// Process row as sent by the server. Older rows carry `process_name`
/// instead of `name`.
#[derive(Debug, Default, Deserialize)]
pub struct WireProcess {
    pub pid: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub process_name: Option<String>,
    #[serde(default)]
    pub cpu_percent: Option<f64>,
    #[serde(default)]
    pub memory_mb: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireSample {
    timestamp: WireTimestamp,
    cpu: CpuReading,
    ram: RamUsage,
    disk: DiskUsage,
    #[serde(default)]
    top_processes: Vec<WireProcess>,
}

/// Resolve the process name from whichever field the server populated.
pub fn normalize_process_name(entry: &WireProcess) -> String {
    [entry.name.as_deref(), entry.process_name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

impl From<WireProcess> for ProcessEntry {
    fn from(p: WireProcess) -> Self {
        let name = normalize_process_name(&p);
        ProcessEntry {
            pid: p.pid,
            name,
            cpu_percent: p.cpu_percent.unwrap_or_default(),
            memory_mb: p.memory_mb.unwrap_or_default(),
        }
    }
}

impl Sample {
    /// Decode one push message (or the current-snapshot response body).
    pub fn from_json(text: &str) -> Result<Sample, SampleError> {
        let wire: WireSample = serde_json::from_str(text)?;
        Ok(Sample {
            timestamp: wire.timestamp.resolve()?,
            cpu_percent: wire.cpu.percent,
            ram: wire.ram,
            disk: wire.disk,
            top_processes: wire.top_processes.into_iter().map(Into::into).collect(),
        })
    }
}

/// Project a sample onto the chart's time axis.
pub fn derive(sample: &Sample) -> ChartPoint {
    ChartPoint {
        time: sample.timestamp,
        label: sample
            .timestamp
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string(),
        cpu: sample.cpu_percent,
        ram: sample.ram.percent,
        disk: sample.disk.percent,
    }
}

/// Busiest processes first, at most `limit` of them.
pub fn top_processes(sample: &Sample, limit: usize) -> Vec<ProcessEntry> {
    let mut procs = sample.top_processes.clone();
    procs.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
    procs.truncate(limit);
    procs
}

pub fn clamp_pct(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 100.0)
    }
}
