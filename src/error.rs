// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Keyveve

use thiserror::Error;

/// Result type alias for Keyveve operations
pub type Result<T> = std::result::Result<T, KeyveveError>;

/// Keyveve error types
#[derive(Error, Debug)]
pub enum KeyveveError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("API returned status {status} for {url}")]
    ApiStatus { status: u16, url: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("An analysis run is already in progress or complete")]
    AnalysisInProgress,
}
