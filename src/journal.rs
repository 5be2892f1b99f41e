// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Audit trail of document changes sent to the portal.
//!
//! Every status change or rename decision the CLI makes is recorded with its
//! project. Replaying the trail gives the state the portal should now report,
//! and [`audit`] lists the documents where it doesn't.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Document, DocumentStatus, RenameAction};
use crate::Result;

/// What was changed on a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    Status { status: DocumentStatus },
    Rename { action: RenameAction, name: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub project_id: String,
    pub document_id: String,
    pub mutation: Mutation,
}

/// State a document should have after every recorded change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expected {
    pub status: Option<DocumentStatus>,
    /// Set by an accepted rename
    pub final_name: Option<String>,
    /// A rename was decided, so no suggestion should be pending
    pub suggestion_resolved: bool,
}

/// A difference between the trail and what the portal reports
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "drift", rename_all = "snake_case")]
pub enum Drift {
    /// The portal no longer lists the document
    Missing { document_id: String },
    Status { document_id: String, expected: DocumentStatus, actual: DocumentStatus },
    Name { document_id: String, expected: String, actual: Option<String> },
    /// A decided rename still shows a suggestion
    SuggestionPending { document_id: String, suggestion: String },
}

/// Fold a project's entries, oldest first, into per-document expectations
pub fn expected_state(entries: &[JournalEntry], project_id: &str) -> BTreeMap<String, Expected> {
    let mut state: BTreeMap<String, Expected> = BTreeMap::new();

    for entry in entries.iter().filter(|e| e.project_id == project_id) {
        let expected = state.entry(entry.document_id.clone()).or_default();
        match &entry.mutation {
            Mutation::Status { status } => expected.status = Some(*status),
            Mutation::Rename { action: RenameAction::Accept, name } => {
                expected.final_name = name.clone();
                expected.suggestion_resolved = true;
            }
            Mutation::Rename { action: RenameAction::Dismiss, .. } => {
                expected.suggestion_resolved = true;
            }
        }
    }

    state
}

/// Compare the trail for `project_id` with the portal's current documents
pub fn audit(entries: &[JournalEntry], project_id: &str, documents: &[Document]) -> Vec<Drift> {
    let mut drift = Vec::new();

    for (document_id, expected) in expected_state(entries, project_id) {
        let Some(document) = documents.iter().find(|d| d.id == document_id) else {
            drift.push(Drift::Missing { document_id });
            continue;
        };

        if let Some(status) = expected.status {
            if document.status != status {
                drift.push(Drift::Status {
                    document_id: document_id.clone(),
                    expected: status,
                    actual: document.status,
                });
            }
        }

        if let Some(name) = &expected.final_name {
            if document.final_name.as_ref() != Some(name) {
                drift.push(Drift::Name {
                    document_id: document_id.clone(),
                    expected: name.clone(),
                    actual: document.final_name.clone(),
                });
            }
        }

        if expected.suggestion_resolved {
            if let Some(suggestion) = &document.ai_suggested_name {
                drift.push(Drift::SuggestionPending {
                    document_id,
                    suggestion: suggestion.clone(),
                });
            }
        }
    }

    drift
}

/// JSONL file holding the trail
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Record a change the portal has accepted
    pub fn record(&self, project_id: &str, document_id: &str, mutation: Mutation) -> Result<JournalEntry> {
        let entry = JournalEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            project_id: project_id.to_string(),
            document_id: document_id.to_string(),
            mutation,
        };

        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(&line)?;

        debug!("Journaled {:?} for document {}", entry.mutation, document_id);
        Ok(entry)
    }

    /// Every entry, oldest first. Unreadable lines are skipped.
    pub fn entries(&self) -> Result<Vec<JournalEntry>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(idx, line)| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping {}:{}: {}", self.path.display(), idx + 1, e);
                    None
                }
            })
            .collect())
    }

    /// Newest `count` entries, newest first, optionally for one project
    pub fn recent(&self, count: usize, project_id: Option<&str>) -> Result<Vec<JournalEntry>> {
        Ok(self.entries()?
            .into_iter()
            .rev()
            .filter(|e| project_id.map_or(true, |p| e.project_id == p))
            .take(count)
            .collect())
    }

    /// Check the portal's documents for `project_id` against the trail
    pub fn audit(&self, project_id: &str, documents: &[Document]) -> Result<Vec<Drift>> {
        Ok(audit(&self.entries()?, project_id, documents))
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
