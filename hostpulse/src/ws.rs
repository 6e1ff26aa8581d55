//! Push-channel transport: one WebSocket to the metrics server, reconnected
//! on a fixed delay until the manager is closed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::sync::{mpsc::UnboundedSender, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::types::Sample;

/// Delay between a drop and the next connect attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    ReconnectPending,
}

#[derive(Debug, Clone)]
pub enum TransportEvent {
    Connecting,
    Opened,
    Sample(Sample),
    Error(String),
    Closed,
}

// Shared between the manager and its connection task. Every state change goes
// through the watch lock and checks `closed` under it, so nothing the task
// does can land after `close()` has published `Disconnected`.
struct Link {
    state: watch::Sender<ConnectionState>,
    closed: AtomicBool,
    events: UnboundedSender<TransportEvent>,
}

impl Link {
    fn transition(&self, next: ConnectionState) -> bool {
        let mut allowed = false;
        self.state.send_if_modified(|s| {
            if self.closed.load(Ordering::SeqCst) {
                return false;
            }
            allowed = true;
            if *s == next {
                return false;
            }
            *s = next;
            true
        });
        allowed
    }

    fn emit(&self, ev: TransportEvent) {
        if !self.closed.load(Ordering::SeqCst) {
            let _ = self.events.send(ev);
        }
    }

    fn shut(&self) -> bool {
        self.state.send_if_modified(|s| {
            self.closed.store(true, Ordering::SeqCst);
            let changed = *s != ConnectionState::Disconnected;
            *s = ConnectionState::Disconnected;
            changed
        })
    }
}

pub struct TransportManager {
    url: String,
    retry_delay: Duration,
    link: Arc<Link>,
    task: Option<JoinHandle<()>>,
}

impl TransportManager {
    pub fn new(
        url: impl Into<String>,
        retry_delay: Duration,
        events: UnboundedSender<TransportEvent>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            url: url.into(),
            retry_delay,
            link: Arc::new(Link {
                state,
                closed: AtomicBool::new(true),
                events,
            }),
            task: None,
        }
    }

    /// Start connecting. A second call while open is a no-op.
    pub fn open(&mut self) {
        if self.task.is_some() {
            return;
        }
        self.link.closed.store(false, Ordering::SeqCst);
        let link = Arc::clone(&self.link);
        let url = self.url.clone();
        let delay = self.retry_delay;
        self.task = Some(tokio::spawn(run_connection(link, url, delay)));
    }

    /// Tear down the connection and any pending reconnect. Idempotent.
    pub fn close(&mut self) {
        if self.link.shut() {
            info!(url = %self.url, "push channel closed");
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.link.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.link.state.subscribe()
    }
}

impl Drop for TransportManager {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_connection(link: Arc<Link>, url: String, retry_delay: Duration) {
    loop {
        if !link.transition(ConnectionState::Connecting) {
            return;
        }
        link.emit(TransportEvent::Connecting);

        match connect_async(url.as_str()).await {
            Ok((mut ws, _)) => {
                if !link.transition(ConnectionState::Connected) {
                    return;
                }
                info!(%url, "push channel open");
                link.emit(TransportEvent::Opened);
                read_frames(&link, &mut ws).await;
            }
            Err(e) => {
                warn!(%url, "connect failed: {e}; retrying in {retry_delay:?}");
                link.emit(TransportEvent::Error(e.to_string()));
            }
        }

        if !link.transition(ConnectionState::ReconnectPending) {
            return;
        }
        tokio::time::sleep(retry_delay).await;
    }
}

async fn read_frames<S>(link: &Link, ws: &mut S)
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(frame) = ws.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    warn!("dropping non-utf8 binary frame");
                    continue;
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!("push channel error: {e}");
                link.emit(TransportEvent::Error(e.to_string()));
                return;
            }
        };
        match Sample::from_json(&text) {
            Ok(sample) => {
                debug!(ts = %sample.timestamp, "sample");
                link.emit(TransportEvent::Sample(sample));
            }
            Err(e) => warn!("dropping frame: {e}"),
        }
    }
    info!("push channel closed by server");
    link.emit(TransportEvent::Closed);
}
