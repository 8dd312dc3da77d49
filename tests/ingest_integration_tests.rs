//! End-to-end ingestion: parse input, process samples, dispatch genres

mod common;

use async_trait::async_trait;
use cadence::commands::{ingest, parse_session, parse_telemetry};
use cadence::dispatch::{GenreDispatcher, PlaybackProvider};
use cadence::{CadenceConfig, factory};
use cadence_core_resilience::{ResilienceError, RetryPolicy};
use common::{orchestrator, TestCache, TestStore};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingProvider {
    played: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl PlaybackProvider for RecordingProvider {
    async fn play_genre(&self, session_id: &str, genre: &str) -> Result<(), ResilienceError> {
        self.played
            .lock()
            .unwrap()
            .push((session_id.to_string(), genre.to_string()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

const SESSION: &str = r#"{
    "session_id": "raid-42",
    "default_genre": "exploration",
    "rules": [
        {"metric_name": "hp", "operator": "lt", "threshold": 10, "target_genre": "funeral"},
        {"metric_name": "energy", "operator": ">", "threshold": 90, "target_genre": "battle", "priority": 5}
    ]
}"#;

const SAMPLES: &str = r#"
{"session_id": "raid-42", "timestamp": 1700000000, "metrics": {"hp": 5, "energy": 95}}
{"session_id": "raid-42", "timestamp": "2023-11-14T22:13:25Z", "metrics": {"hp": 5, "energy": 10}}
{"session_id": "raid-42", "metrics": {"hp": 80}}
{"session_id": "nobody", "metrics": {"hp": 1}}
"#;

#[tokio::test]
async fn test_ingest_dispatches_each_resolved_genre() {
    let cache = TestCache::new();
    let store = TestStore::new();
    let engine = orchestrator(&cache, &store);
    engine
        .process_session(parse_session(SESSION).unwrap())
        .await
        .unwrap();

    let provider = Arc::new(RecordingProvider::default());
    let dispatcher = GenreDispatcher::new(provider.clone(), RetryPolicy::none());

    let report = ingest(&engine, Some(&dispatcher), parse_telemetry(SAMPLES).unwrap())
        .await
        .unwrap();

    let genres: Vec<_> = report
        .outcomes
        .iter()
        .map(|outcome| outcome.target_genre.as_deref())
        .collect();
    assert_eq!(
        genres,
        vec![Some("battle"), Some("funeral"), Some("exploration"), None]
    );
    assert!(report.is_durable());

    let mut played = provider.played.lock().unwrap().clone();
    played.sort();
    assert_eq!(played.len(), 3);
    assert!(played.iter().all(|(session, _)| session == "raid-42"));
}

#[tokio::test(start_paused = true)]
async fn test_ingest_reports_non_durable_samples() {
    let cache = TestCache::new();
    let store = TestStore::new();
    let engine = orchestrator(&cache, &store);
    store.faults.fail_writes(3);

    let report = ingest(&engine, None, parse_telemetry(SAMPLES).unwrap())
        .await
        .unwrap();

    assert!(!report.is_durable());
    assert_eq!(report.not_durable().count(), 1);
}

#[tokio::test]
async fn test_ingest_with_configured_backends() {
    let config = CadenceConfig::default();
    let engine = factory::build_orchestrator(&config).await.unwrap();
    let dispatcher = factory::build_dispatcher(&config).unwrap();

    engine
        .process_session(parse_session(SESSION).unwrap())
        .await
        .unwrap();
    let report = ingest(&engine, Some(&dispatcher), parse_telemetry(SAMPLES).unwrap())
        .await
        .unwrap();
    assert_eq!(report.outcomes.len(), 4);

    let latest = engine.get_telemetry("raid-42").await.unwrap().unwrap();
    assert_eq!(latest.metric("hp"), Some(80.0));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["outcomes"][0]["status"], "CRITICAL");
    assert_eq!(json["outcomes"][0]["telemetry"]["outcome"], "persisted");
    assert!(json["outcomes"][3]["state"].is_null());
}
