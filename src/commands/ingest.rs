//! Telemetry ingestion command

use crate::dispatch::GenreDispatcher;
use crate::engine::{Orchestrator, TelemetryOutcome};
use crate::error::Result;
use cadence_core_model::TelemetryPayload;
use serde::Serialize;
use tracing::{info, warn};

/// Outcomes of one ingestion run, in input order
#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    pub outcomes: Vec<TelemetryOutcome>,
}

impl IngestReport {
    /// Every sample and state write reached the durable store
    pub fn is_durable(&self) -> bool {
        self.outcomes.iter().all(TelemetryOutcome::is_durable)
    }

    pub fn not_durable(&self) -> impl Iterator<Item = &TelemetryOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_durable())
    }
}

/// Process samples in order, dispatching each resolved genre
///
/// Provider calls run in the background; they are awaited before returning
/// so the process does not exit under them.
pub async fn ingest(
    orchestrator: &Orchestrator,
    dispatcher: Option<&GenreDispatcher>,
    samples: Vec<TelemetryPayload>,
) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    let mut dispatches = Vec::new();

    for payload in samples {
        let outcome = orchestrator.process_telemetry(payload).await?;

        if let (Some(dispatcher), Some(genre)) = (dispatcher, outcome.target_genre.as_deref()) {
            dispatches.push(dispatcher.dispatch(outcome.session_id.clone(), genre));
        }
        report.outcomes.push(outcome);
    }

    for handle in dispatches {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Playback switch failed: {}", e),
            Err(e) => warn!("Playback task failed: {}", e),
        }
    }

    info!(
        "Ingested {} samples ({} not durable)",
        report.outcomes.len(),
        report.not_durable().count()
    );
    Ok(report)
}
