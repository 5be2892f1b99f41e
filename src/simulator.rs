// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Staged "analysis" run shown while documents are organized
//!
//! The stages are cosmetic and advance on fixed timers. Only the final step
//! does real work: it asks the server to organize the project, refetches the
//! documents and classifies them.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::api::DocumentBackend;
use crate::classifier::FolderGroup;
use crate::models::Document;
use crate::store::DocumentStore;
use crate::{KeyveveError, Result};

/// Stage of an analysis run. Runs move strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    Idle,
    Preparing,
    Scanning,
    Classifying,
    Organizing,
    Renaming,
    Complete,
}

impl AnalysisStage {
    /// Whether the trigger should be disabled
    pub fn is_locked(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Idle => "Ready to analyze",
            Self::Preparing => "Preparing documents",
            Self::Scanning => "Scanning document contents",
            Self::Classifying => "Classifying document types",
            Self::Organizing => "Organizing into folders",
            Self::Renaming => "Generating file names",
            Self::Complete => "Analysis complete",
        }
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Stages reached on timers, in order, after `Preparing`
const TIMED_STAGES: [AnalysisStage; 4] = [
    AnalysisStage::Scanning,
    AnalysisStage::Classifying,
    AnalysisStage::Organizing,
    AnalysisStage::Renaming,
];

/// Notifications emitted while a run progresses
#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    StageChanged(AnalysisStage),
    Completed { run_id: Uuid, documents: usize },
    /// User-visible failure message
    Failed(String),
}

/// Result of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub run_id: Uuid,
    pub project_id: String,
    pub service: String,
    pub groups: Vec<FolderGroup>,
}

impl AnalysisOutcome {
    pub fn document_count(&self) -> usize {
        self.groups.iter().map(|g| g.documents.len()).sum()
    }
}

/// Runs one staged analysis at a time for a project
pub struct AnalysisSimulator<B: DocumentBackend + ?Sized> {
    backend: Arc<B>,
    store: Arc<DocumentStore>,
    service: String,
    /// Offsets of the four timed stages followed by completion
    offsets: Vec<Duration>,
    state: watch::Sender<AnalysisStage>,
    events: broadcast::Sender<AnalysisEvent>,
}

impl<B: DocumentBackend + ?Sized> AnalysisSimulator<B> {
    /// `offsets` must hold five increasing durations: four stage changes
    /// followed by completion.
    pub fn new(
        backend: Arc<B>,
        store: Arc<DocumentStore>,
        service: impl Into<String>,
        offsets: Vec<Duration>,
    ) -> Result<Self> {
        if offsets.len() != TIMED_STAGES.len() + 1 {
            return Err(KeyveveError::Config(format!(
                "expected {} stage offsets, got {}", TIMED_STAGES.len() + 1, offsets.len()
            )));
        }
        if offsets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(KeyveveError::Config("stage offsets must be strictly increasing".to_string()));
        }

        let (state, _) = watch::channel(AnalysisStage::Idle);
        let (events, _) = broadcast::channel(32);

        Ok(Self {
            backend,
            store,
            service: service.into(),
            offsets,
            state,
            events,
        })
    }

    pub fn stage(&self) -> AnalysisStage {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<AnalysisStage> {
        self.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AnalysisEvent> {
        self.events.subscribe()
    }

    fn enter(&self, stage: AnalysisStage) {
        info!("{}", stage);
        self.state.send_replace(stage);
        // No subscribers is fine
        let _ = self.events.send(AnalysisEvent::StageChanged(stage));
    }

    /// Run the full staged analysis for `project_id`.
    ///
    /// Fails with [`KeyveveError::AnalysisInProgress`] if a run is active or has
    /// already completed. If the final network step fails, the run reports the
    /// error, returns to `Idle` and leaves the document store as it was.
    /// Dropping the future before it finishes also returns to `Idle`.
    pub async fn run(&self, project_id: &str) -> Result<AnalysisOutcome> {
        let claimed = self.state.send_if_modified(|stage| {
            if stage.is_locked() {
                false
            } else {
                *stage = AnalysisStage::Preparing;
                true
            }
        });
        if !claimed {
            return Err(KeyveveError::AnalysisInProgress);
        }
        let mut guard = RunGuard { state: &self.state, completed: false };

        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!("Starting analysis {} for project {}", run_id, project_id);
        let _ = self.events.send(AnalysisEvent::StageChanged(AnalysisStage::Preparing));

        for (stage, offset) in TIMED_STAGES.iter().zip(&self.offsets) {
            sleep_until(started + *offset).await;
            self.enter(*stage);
        }
        sleep_until(started + self.offsets[TIMED_STAGES.len()]).await;

        match self.finish(project_id).await {
            Ok(documents) => {
                let groups = self.store.grouped(&self.service);
                self.enter(AnalysisStage::Complete);
                guard.completed = true;
                let _ = self.events.send(AnalysisEvent::Completed {
                    run_id,
                    documents: documents.len(),
                });
                Ok(AnalysisOutcome {
                    run_id,
                    project_id: project_id.to_string(),
                    service: self.service.clone(),
                    groups,
                })
            }
            Err(e) => {
                error!("Failed to analyze documents for project {}: {}", project_id, e);
                let _ = self.events.send(AnalysisEvent::Failed(format!(
                    "Failed to analyze documents: {}", e
                )));
                drop(guard);
                Err(e)
            }
        }
    }

    async fn finish(&self, project_id: &str) -> Result<Vec<Document>> {
        self.backend.organize(project_id).await?;
        let documents = self.backend.list_documents(project_id).await?;
        self.store.replace_all(documents.clone());
        Ok(documents)
    }
}

/// Puts the simulator back to `Idle` unless the run completed
struct RunGuard<'a> {
    state: &'a watch::Sender<AnalysisStage>,
    completed: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            debug!("Analysis run ended early, back to idle");
            self.state.send_replace(AnalysisStage::Idle);
        }
    }
}
