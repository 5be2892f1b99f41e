// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Local, observable cache of a project's documents
//!
//! Mutations go to the server first. The cached copy changes only after the
//! server accepted them.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::DocumentBackend;
use crate::classifier::{Classifier, FolderGroup};
use crate::models::{Document, DocumentStatus, RenameAction};
use crate::{KeyveveError, Result};

pub struct DocumentStore {
    documents: watch::Sender<Vec<Document>>,
    classifier: Classifier,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(Classifier::default())
    }
}

impl DocumentStore {
    pub fn new(classifier: Classifier) -> Self {
        let (documents, _) = watch::channel(Vec::new());
        Self { documents, classifier }
    }

    /// Receive the document list every time it changes
    pub fn subscribe(&self) -> watch::Receiver<Vec<Document>> {
        self.documents.subscribe()
    }

    pub fn snapshot(&self) -> Vec<Document> {
        self.documents.borrow().clone()
    }

    pub fn get(&self, doc_id: &str) -> Option<Document> {
        self.documents.borrow().iter().find(|d| d.id == doc_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.borrow().is_empty()
    }

    /// Replace the cache with a fresh server listing
    pub fn replace_all(&self, documents: Vec<Document>) {
        debug!("Document store refreshed with {} documents", documents.len());
        self.documents.send_replace(documents);
    }

    /// Current documents grouped into the taxonomy for `service`
    pub fn grouped(&self, service: &str) -> Vec<FolderGroup> {
        self.classifier.group(&self.documents.borrow(), service)
    }

    /// Change a document's status on the server, then locally
    pub async fn set_status<B: DocumentBackend + ?Sized>(
        &self,
        backend: &B,
        doc_id: &str,
        status: DocumentStatus,
    ) -> Result<()> {
        self.ensure_known(doc_id)?;

        backend.update_status(doc_id, status).await.map_err(|e| {
            warn!("Failed to update status of {}: {}", doc_id, e);
            e
        })?;

        self.modify(doc_id, |doc| doc.status = status);
        info!("Document {} marked {}", doc_id, status);
        Ok(())
    }

    /// Accept or dismiss a suggested rename on the server, then locally
    pub async fn resolve_rename<B: DocumentBackend + ?Sized>(
        &self,
        backend: &B,
        doc_id: &str,
        action: RenameAction,
    ) -> Result<()> {
        let document = self.ensure_known(doc_id)?;
        let suggestion = document.ai_suggested_name.clone();

        if action == RenameAction::Accept && suggestion.is_none() {
            return Err(KeyveveError::InvalidValue(format!(
                "document {} has no suggested name to accept", doc_id
            )));
        }

        backend.rename(doc_id, action, suggestion.as_deref()).await.map_err(|e| {
            warn!("Failed to resolve rename of {}: {}", doc_id, e);
            e
        })?;

        self.modify(doc_id, |doc| {
            if action == RenameAction::Accept {
                doc.final_name = doc.ai_suggested_name.take();
            } else {
                doc.ai_suggested_name = None;
            }
        });
        Ok(())
    }

    fn ensure_known(&self, doc_id: &str) -> Result<Document> {
        self.get(doc_id)
            .ok_or_else(|| KeyveveError::InvalidValue(format!("unknown document '{}'", doc_id)))
    }

    fn modify(&self, doc_id: &str, change: impl FnOnce(&mut Document)) {
        self.documents.send_if_modified(|docs| {
            match docs.iter_mut().find(|d| d.id == doc_id) {
                Some(doc) => {
                    change(doc);
                    true
                }
                None => false,
            }
        });
    }
}
