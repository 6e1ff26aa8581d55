//! Historical and current-snapshot retrieval against a local server, and the
//! loader feeding results back through the coordinator.

mod common;

use std::collections::HashMap;
use std::time::Duration;

use axum::http::StatusCode;
use common::{sample_json, serve, Fixture};
use hostpulse::error::RetrievalError;
use hostpulse::history::HistoricalLoader;
use hostpulse::{TimeRange, ViewCoordinator, ViewEvent, ViewMode};
use tokio::sync::mpsc::unbounded_channel;
use url::Url;

const WEEK_NEWEST_FIRST: &str = r#"[
    {"id":3,"timestamp":"2024-05-03T00:00:00","cpu_percent":3.0,"ram_percent":33.0,"disk_percent":50.0,"ram_used_gb":5.0,"ram_total_gb":16.0,"disk_used_gb":100.0,"disk_total_gb":200.0},
    {"id":2,"timestamp":"2024-05-02T00:00:00","cpu_percent":2.0,"ram_percent":22.0,"disk_percent":50.0,"ram_used_gb":4.0,"ram_total_gb":16.0,"disk_used_gb":100.0,"disk_total_gb":200.0},
    {"id":1,"timestamp":"2024-05-01T00:00:00","cpu_percent":1.0,"ram_percent":11.0,"disk_percent":50.0,"ram_used_gb":3.0,"ram_total_gb":16.0,"disk_used_gb":100.0,"disk_total_gb":200.0}
]"#;

fn loader_for(addr: std::net::SocketAddr) -> HistoricalLoader {
    HistoricalLoader::new(Url::parse(&format!("http://{addr}/")).unwrap()).unwrap()
}

#[tokio::test]
async fn week_history_arrives_oldest_first() {
    let mut history = HashMap::new();
    history.insert("10080".to_string(), (StatusCode::OK, WEEK_NEWEST_FIRST.to_string()));
    let addr = serve(Fixture {
        history,
        ..Default::default()
    })
    .await;

    let samples = loader_for(addr).load(TimeRange::Week).await.unwrap();
    let cpus: Vec<f64> = samples.iter().map(|s| s.cpu_percent).collect();
    assert_eq!(cpus, vec![1.0, 2.0, 3.0]);
}

#[tokio::test]
async fn server_error_is_a_retrieval_failure() {
    let mut history = HashMap::new();
    history.insert(
        "43200".to_string(),
        (StatusCode::INTERNAL_SERVER_ERROR, "db down".to_string()),
    );
    let addr = serve(Fixture {
        history,
        ..Default::default()
    })
    .await;

    let err = loader_for(addr).load(TimeRange::Month).await.unwrap_err();
    assert!(matches!(err, RetrievalError::Status(s) if s.as_u16() == 500));
}

#[tokio::test]
async fn current_snapshot_and_health() {
    let addr = serve(Fixture {
        current: Some((StatusCode::OK, sample_json("2024-05-01T10:00:00Z", 12.0))),
        ..Default::default()
    })
    .await;
    let loader = loader_for(addr);
    let s = loader.fetch_current().await.unwrap();
    assert_eq!(s.cpu_percent, 12.0);
    assert_eq!(s.top_processes[0].name, "init");

    let health = loader.health().await.unwrap();
    assert_eq!(health.status, "online");
}

#[tokio::test]
async fn superseded_load_never_lands() {
    let mut history = HashMap::new();
    history.insert("10080".to_string(), (StatusCode::OK, WEEK_NEWEST_FIRST.to_string()));
    history.insert(
        "43200".to_string(),
        (
            StatusCode::OK,
            r#"[{"timestamp":"2024-04-10T00:00:00","cpu_percent":30.0,"ram_percent":1.0,"disk_percent":1.0}]"#
                .to_string(),
        ),
    );
    let addr = serve(Fixture {
        history,
        ..Default::default()
    })
    .await;
    let loader = loader_for(addr);
    let (tx, mut rx) = unbounded_channel();
    let mut view = ViewCoordinator::default();

    let week = view.dispatch(ViewEvent::SetViewMode(ViewMode::Historical)).unwrap();
    let month = view.dispatch(ViewEvent::SetTimeRange(TimeRange::Month)).unwrap();
    loader.spawn_load(week, tx.clone());
    loader.spawn_load(month, tx);

    for _ in 0..2 {
        let ev = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        view.dispatch(ev);
    }
    let snap = view.snapshot();
    assert!(!snap.loading_history);
    assert_eq!(snap.series.len(), 1);
    assert_eq!(snap.series[0].cpu, 30.0);
}
