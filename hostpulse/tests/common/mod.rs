//! Local metrics server for integration tests: `/ws/metrics` pushes canned
//! frames, `/api/...` serves canned HTTP bodies.

#![allow(dead_code)]

use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

#[derive(Clone, Default)]
pub struct Fixture {
    /// Frames pushed to every websocket client, in order.
    pub frames: Vec<String>,
    /// Close the socket after the frames instead of holding it open.
    pub close_after: bool,
    /// minutes -> (status, body)
    pub history: HashMap<String, (StatusCode, String)>,
    pub current: Option<(StatusCode, String)>,
}

pub fn sample_json(ts: &str, cpu: f64) -> String {
    format!(
        r#"{{"timestamp":"{ts}","cpu":{{"percent":{cpu}}},
        "ram":{{"percent":40.0,"used_gb":6.4,"total_gb":16.0,"available_gb":9.6}},
        "disk":{{"percent":55.0,"used_gb":110.0,"total_gb":200.0,"free_gb":90.0}},
        "top_processes":[{{"pid":1,"name":"init","cpu_percent":0.5,"memory_mb":12.0}}]}}"#
    )
}

pub async fn serve(fixture: Fixture) -> SocketAddr {
    let app = Router::new()
        .route("/", get(health))
        .route("/ws/metrics", get(ws_handler))
        .route("/api/metrics/history", get(history))
        .route("/api/metrics/current", get(current))
        .with_state(Arc::new(fixture));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing listens on.
pub async fn dead_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

async fn health() -> &'static str {
    r#"{"status":"online","service":"System Monitoring API","version":"1.0.0"}"#
}

async fn ws_handler(ws: WebSocketUpgrade, State(fx): State<Arc<Fixture>>) -> Response {
    ws.on_upgrade(move |socket| push_frames(socket, fx))
}

async fn push_frames(mut socket: WebSocket, fx: Arc<Fixture>) {
    for frame in &fx.frames {
        if socket.send(Message::Text(frame.clone())).await.is_err() {
            return;
        }
    }
    if fx.close_after {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }
    while let Some(Ok(msg)) = socket.recv().await {
        if let Message::Close(_) = msg {
            break;
        }
    }
}

async fn history(
    State(fx): State<Arc<Fixture>>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let minutes = q.get("minutes").cloned().unwrap_or_default();
    match fx.history.get(&minutes) {
        Some((status, body)) => (*status, body.clone()).into_response(),
        None => (StatusCode::BAD_REQUEST, format!("unexpected minutes={minutes}")).into_response(),
    }
}

async fn current(State(fx): State<Arc<Fixture>>) -> Response {
    match &fx.current {
        Some((status, body)) => (*status, body.clone()).into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
