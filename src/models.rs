// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Portal data types exchanged with the REST API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::KeyveveError;

/// Where a document's bytes are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageLocation {
    Cloud,
    Sharepoint,
    Cch,
    #[default]
    Keyveve,
}

/// Who a document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocCategory {
    #[default]
    Client,
    Internal,
    Permanent,
}

/// Review status of a document.
///
/// Any status may be set from any other; the portal applies no guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    AwaitingReview,
    Reviewed,
    Signed,
    Filed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingReview => "awaiting_review",
            Self::Reviewed => "reviewed",
            Self::Signed => "signed",
            Self::Filed => "filed",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = KeyveveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "awaiting_review" => Ok(Self::AwaitingReview),
            "reviewed" => Ok(Self::Reviewed),
            "signed" => Ok(Self::Signed),
            "filed" => Ok(Self::Filed),
            other => Err(KeyveveError::InvalidValue(format!("unknown document status '{}'", other))),
        }
    }
}

/// A client document as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub doc_type: Option<String>,
    /// Text produced by the server-side extraction step
    #[serde(default, alias = "summary")]
    pub extracted_text: Option<String>,
    #[serde(default)]
    pub storage_location: StorageLocation,
    #[serde(default)]
    pub doc_category: DocCategory,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub ai_suggested_name: Option<String>,
    #[serde(default)]
    pub final_name: Option<String>,
}

impl Document {
    /// Minimal document, mostly useful for classification
    pub fn new(id: impl Into<String>, original_name: impl Into<String>, doc_type: Option<&str>) -> Self {
        Self {
            id: id.into(),
            original_name: original_name.into(),
            doc_type: doc_type.map(String::from),
            extracted_text: None,
            storage_location: StorageLocation::default(),
            doc_category: DocCategory::default(),
            status: DocumentStatus::default(),
            ai_suggested_name: None,
            final_name: None,
        }
    }

    /// Accepted name if there is one, else the uploaded name
    pub fn display_name(&self) -> &str {
        self.final_name.as_deref().unwrap_or(&self.original_name)
    }
}

/// Accept or dismiss an AI-suggested rename
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenameAction {
    Accept,
    Dismiss,
}

impl FromStr for RenameAction {
    type Err = KeyveveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accept" => Ok(Self::Accept),
            "dismiss" => Ok(Self::Dismiss),
            other => Err(KeyveveError::InvalidValue(format!("unknown rename action '{}'", other))),
        }
    }
}

/// An engagement for one client and one service line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub service_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub assigned_staff: Vec<Staff>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Query parameters for `GET /projects/`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProject {
    pub name: String,
    pub client_name: String,
    pub service_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QaRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QaResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleRequest {
    pub scheduled_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

/// Multipart upload of a local file into a project
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub project_id: String,
    pub path: PathBuf,
    pub process_async: bool,
    pub storage_location: StorageLocation,
    pub doc_category: DocCategory,
}

impl StorageLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::Sharepoint => "sharepoint",
            Self::Cch => "cch",
            Self::Keyveve => "keyveve",
        }
    }
}

impl FromStr for StorageLocation {
    type Err = KeyveveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cloud" => Ok(Self::Cloud),
            "sharepoint" => Ok(Self::Sharepoint),
            "cch" => Ok(Self::Cch),
            "keyveve" => Ok(Self::Keyveve),
            other => Err(KeyveveError::InvalidValue(format!("unknown storage location '{}'", other))),
        }
    }
}

impl DocCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Internal => "internal",
            Self::Permanent => "permanent",
        }
    }
}

impl FromStr for DocCategory {
    type Err = KeyveveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "client" => Ok(Self::Client),
            "internal" => Ok(Self::Internal),
            "permanent" => Ok(Self::Permanent),
            other => Err(KeyveveError::InvalidValue(format!("unknown document category '{}'", other))),
        }
    }
}

/// The server is not consistent about numeric vs string ids
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number id, got {}", other))),
    }
}
