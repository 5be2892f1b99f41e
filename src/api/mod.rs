// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! HTTP client for the portal REST API
//!
//! Requests are sent once; there is no retry, deduplication or idempotency key.
//! Non-2xx responses become [`KeyveveError::ApiStatus`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::models::{
    Document, DocumentStatus, NewProject, Notification, Project, ProjectFilter, QaRequest,
    QaResponse, RenameAction, ScheduleRequest, Staff, UploadRequest,
};
use crate::{KeyveveError, Result};

/// The document operations the organizer and the local store depend on
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Ask the server to organize a project's documents
    async fn organize(&self, project_id: &str) -> Result<()>;

    /// Current documents of a project
    async fn list_documents(&self, project_id: &str) -> Result<Vec<Document>>;

    /// Set a document's review status
    async fn update_status(&self, doc_id: &str, status: DocumentStatus) -> Result<()>;

    /// Accept or dismiss the suggested rename of a document
    async fn rename(&self, doc_id: &str, action: RenameAction, new_name: Option<&str>) -> Result<()>;
}

/// Portal API client
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentList {
    Bare(Vec<Document>),
    Wrapped { documents: Vec<Document> },
}

#[derive(Serialize)]
struct StatusBody {
    status: DocumentStatus,
}

#[derive(Serialize)]
struct AssignStaffBody<'a> {
    staff_ids: &'a [String],
}

#[derive(Serialize)]
struct NotificationQuery {
    unread_only: bool,
    limit: u32,
}

impl ApiClient {
    /// Create a new client from config
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config.base_url.trim().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let url = response.url().to_string();
            warn!("API returned status {} for {}", status, url);
            return Err(KeyveveError::ApiStatus { status: status.as_u16(), url });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    // === Projects ===

    pub async fn get_project(&self, project_id: &str) -> Result<Project> {
        debug!("Fetching project {}", project_id);
        self.send_json(self.client.get(self.url(&format!("/projects/{}", project_id)))).await
    }

    pub async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>> {
        self.send_json(self.client.get(self.url("/projects/")).query(filter)).await
    }

    pub async fn create_project(&self, project: &NewProject) -> Result<Project> {
        self.send_json(self.client.post(self.url("/projects/")).json(project)).await
    }

    pub async fn update_project_status(&self, project_id: &str, new_status: &str) -> Result<()> {
        let request = self.client
            .patch(self.url(&format!("/projects/{}/status", project_id)))
            .query(&[("new_status", new_status)]);
        self.send(request).await?;
        Ok(())
    }

    pub async fn assign_staff(&self, project_id: &str, staff_ids: &[String]) -> Result<()> {
        let request = self.client
            .post(self.url(&format!("/projects/{}/assign-staff", project_id)))
            .json(&AssignStaffBody { staff_ids });
        self.send(request).await?;
        Ok(())
    }

    pub async fn list_staff(&self) -> Result<Vec<Staff>> {
        self.send_json(self.client.get(self.url("/staff/"))).await
    }

    // === Documents ===

    /// Upload a local file as multipart form data
    pub async fn upload_document(&self, upload: &UploadRequest) -> Result<serde_json::Value> {
        let bytes = tokio::fs::read(&upload.path).await?;
        let file_name = upload.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let form = Form::new()
            .text("project_id", upload.project_id.clone())
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("process_async", upload.process_async.to_string())
            .text("storage_location", upload.storage_location.as_str())
            .text("doc_category", upload.doc_category.as_str());

        debug!("Uploading {:?} to project {}", upload.path, upload.project_id);
        self.send_json(self.client.post(self.url("/documents/upload")).multipart(form)).await
    }

    pub async fn list_documents(&self, project_id: &str) -> Result<Vec<Document>> {
        let list: DocumentList = self
            .send_json(self.client.get(self.url(&format!("/documents/{}", project_id))))
            .await?;
        Ok(match list {
            DocumentList::Bare(docs) => docs,
            DocumentList::Wrapped { documents } => documents,
        })
    }

    pub async fn organize_documents(&self, project_id: &str) -> Result<()> {
        self.send(self.client.post(self.url(&format!("/documents/organize/{}", project_id)))).await?;
        Ok(())
    }

    /// Resolve a suggested rename (url-encoded form body)
    pub async fn rename_document(
        &self,
        doc_id: &str,
        action: RenameAction,
        new_name: Option<&str>,
    ) -> Result<()> {
        let mut fields = vec![(
            "action",
            match action {
                RenameAction::Accept => "accept",
                RenameAction::Dismiss => "dismiss",
            },
        )];
        if let Some(name) = new_name {
            fields.push(("new_name", name));
        }

        let request = self.client
            .patch(self.url(&format!("/documents/rename/{}", doc_id)))
            .form(&fields);
        self.send(request).await?;
        Ok(())
    }

    pub async fn update_document_status(&self, doc_id: &str, status: DocumentStatus) -> Result<()> {
        let request = self.client
            .patch(self.url(&format!("/documents/{}", doc_id)))
            .json(&StatusBody { status });
        self.send(request).await?;
        Ok(())
    }

    // === Assistant, pricing, integrations ===

    pub async fn ask(&self, question: &QaRequest) -> Result<QaResponse> {
        self.send_json(self.client.post(self.url("/qa")).json(question)).await
    }

    pub async fn pricing(&self, request: &serde_json::Value) -> Result<serde_json::Value> {
        self.send_json(self.client.post(self.url("/pricing/")).json(request)).await
    }

    pub async fn engagement_letter(&self, request: &serde_json::Value) -> Result<serde_json::Value> {
        self.send_json(self.client.post(self.url("/integrations/engagement-letter")).json(request)).await
    }

    pub async fn import_csv(&self, path: &std::path::Path) -> Result<serde_json::Value> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("import.csv")
            .to_string();
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        self.send_json(self.client.post(self.url("/integrations/import-csv")).multipart(form)).await
    }

    pub async fn import_pms(&self, request: &serde_json::Value) -> Result<serde_json::Value> {
        self.send_json(self.client.post(self.url("/integrations/import-pms")).json(request)).await
    }

    pub async fn connect_integration(&self, request: &serde_json::Value) -> Result<serde_json::Value> {
        self.send_json(self.client.post(self.url("/integrations/connect")).json(request)).await
    }

    // === Notifications and tasks ===

    pub async fn list_notifications(&self, unread_only: bool, limit: u32) -> Result<Vec<Notification>> {
        let request = self.client
            .get(self.url("/notifications/"))
            .query(&NotificationQuery { unread_only, limit });
        self.send_json(request).await
    }

    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<()> {
        self.send(self.client.patch(self.url(&format!("/notifications/{}/read", notification_id)))).await?;
        Ok(())
    }

    pub async fn schedule_task(&self, task_id: &str, schedule: &ScheduleRequest) -> Result<serde_json::Value> {
        let request = self.client
            .post(self.url(&format!("/tasks/{}/schedule", task_id)))
            .json(schedule);
        self.send_json(request).await
    }
}

#[async_trait]
impl DocumentBackend for ApiClient {
    async fn organize(&self, project_id: &str) -> Result<()> {
        self.organize_documents(project_id).await
    }

    async fn list_documents(&self, project_id: &str) -> Result<Vec<Document>> {
        ApiClient::list_documents(self, project_id).await
    }

    async fn update_status(&self, doc_id: &str, status: DocumentStatus) -> Result<()> {
        self.update_document_status(doc_id, status).await
    }

    async fn rename(&self, doc_id: &str, action: RenameAction, new_name: Option<&str>) -> Result<()> {
        self.rename_document(doc_id, action, new_name).await
    }
}
