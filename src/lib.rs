// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Keyveve: document organizer for an accounting-firm client portal
//!
//! Folder taxonomies per service line, a rule-based document classifier, the
//! staged analysis run shown while documents are organized, and a client for
//! the portal's REST API.

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod journal;
pub mod models;
pub mod poller;
pub mod simulator;
pub mod store;
pub mod taxonomy;

pub use config::AppConfig;
pub use error::{KeyveveError, Result};
