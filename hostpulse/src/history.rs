//! Historical loader: on-demand retrieval of past samples over HTTP, plus the
//! request-token bookkeeping that keeps superseded loads from landing.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use url::Url;

use crate::coordinator::{HistoryRequest, ViewEvent};
use crate::error::{RetrievalError, SampleError};
use crate::types::{DiskUsage, RamUsage, Sample, TimeRange, WireTimestamp};

const HISTORY_PATH: &str = "api/metrics/history";
const CURRENT_PATH: &str = "api/metrics/current";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Identifies one issued load. Tokens only ever grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// Tracks which load is current. Issuing a new token (or invalidating)
/// makes every earlier one stale.
#[derive(Debug, Default)]
pub struct RequestTracker {
    last: u64,
    current: Option<RequestToken>,
}

impl RequestTracker {
    pub fn issue(&mut self) -> RequestToken {
        self.last += 1;
        let token = RequestToken(self.last);
        self.current = Some(token);
        token
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.current == Some(token)
    }

    /// Consume the current token. Returns false for stale tokens.
    pub fn settle(&mut self, token: RequestToken) -> bool {
        if self.is_current(token) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn invalidate(&mut self) {
        self.current = None;
    }

    pub fn pending(&self) -> Option<RequestToken> {
        self.current
    }
}

/// One stored row from the history endpoint.
#[derive(Debug, Deserialize)]
struct HistoryRecord {
    timestamp: WireTimestamp,
    cpu_percent: f64,
    ram_percent: f64,
    disk_percent: f64,
    #[serde(default)]
    ram_used_gb: f64,
    #[serde(default)]
    ram_total_gb: f64,
    #[serde(default)]
    disk_used_gb: f64,
    #[serde(default)]
    disk_total_gb: f64,
}

impl HistoryRecord {
    fn into_sample(self) -> Result<Sample, SampleError> {
        Ok(Sample {
            timestamp: self.timestamp.resolve()?,
            cpu_percent: self.cpu_percent,
            ram: RamUsage {
                percent: self.ram_percent,
                used_gb: self.ram_used_gb,
                total_gb: self.ram_total_gb,
                available_gb: (self.ram_total_gb - self.ram_used_gb).max(0.0),
            },
            disk: DiskUsage {
                percent: self.disk_percent,
                used_gb: self.disk_used_gb,
                total_gb: self.disk_total_gb,
                free_gb: (self.disk_total_gb - self.disk_used_gb).max(0.0),
            },
            top_processes: Vec::new(),
        })
    }
}

/// Decode a history response (newest first) into samples oldest first.
pub fn decode_history(body: &str) -> Result<Vec<Sample>, SampleError> {
    let records: Vec<HistoryRecord> = serde_json::from_str(body)?;
    let mut samples = records
        .into_iter()
        .rev()
        .map(HistoryRecord::into_sample)
        .collect::<Result<Vec<_>, _>>()?;
    // Stable: equal timestamps keep their reversed order.
    samples.sort_by_key(|s| s.timestamp);
    Ok(samples)
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct HistoricalLoader {
    client: Client,
    base: Url,
}

impl HistoricalLoader {
    pub fn new(base: Url) -> Result<Self, RetrievalError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, base })
    }

    pub fn history_url(&self, range: TimeRange) -> Result<Url, RetrievalError> {
        let mut url = self.base.join(HISTORY_PATH)?;
        url.query_pairs_mut()
            .append_pair("minutes", &range.minutes().to_string());
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String, RetrievalError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RetrievalError::Status(status));
        }
        Ok(resp.text().await?)
    }

    /// Fetch the look-back window for `range`, oldest sample first.
    pub async fn load(&self, range: TimeRange) -> Result<Vec<Sample>, RetrievalError> {
        let url = self.history_url(range)?;
        debug!(%url, days = range.days(), "loading history");
        let body = self.get_text(url).await?;
        Ok(decode_history(&body)?)
    }

    /// Single current reading; used while the push channel is down.
    pub async fn fetch_current(&self) -> Result<Sample, RetrievalError> {
        let url = self.base.join(CURRENT_PATH)?;
        let body = self.get_text(url).await?;
        Ok(Sample::from_json(&body)?)
    }

    pub async fn health(&self) -> Result<HealthStatus, RetrievalError> {
        let resp = self.client.get(self.base.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RetrievalError::Status(status));
        }
        Ok(resp.json::<HealthStatus>().await?)
    }

    /// Run `req` in the background and deliver its outcome as a
    /// `HistoricalResult`. Superseded loads still complete; the coordinator
    /// drops them by token.
    pub fn spawn_load(&self, req: HistoryRequest, events: UnboundedSender<ViewEvent>) {
        let loader = self.clone();
        tokio::spawn(async move {
            let result = loader.load(req.range).await.map_err(|e| {
                warn!(days = req.range.days(), "history retrieval failed: {e}");
                e.to_string()
            });
            let _ = events.send(ViewEvent::HistoricalResult {
                token: req.token,
                result,
            });
        });
    }
}
