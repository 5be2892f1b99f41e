// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Document-to-folder classification

pub mod rules;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::models::Document;
use crate::taxonomy::{folders_for, Folder, ServiceCategory, CLIENT_INFORMATION};
use rules::{rules_for, Rule};

/// How a folder is picked when several rules match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationStrategy {
    /// The first matching rule in table order wins
    #[default]
    FirstMatch,
    /// Folders are scored by total matched text; ties go to the earlier rule
    Scored,
}

/// Classify a document for a free-text service label (first match wins)
pub fn classify(document: &Document, service: &str) -> &'static str {
    classify_fields(
        document.doc_type.as_deref().unwrap_or(""),
        &document.original_name,
        ServiceCategory::from_service(service),
        ClassificationStrategy::FirstMatch,
    )
}

/// Classify raw fields. Never fails: anything unmatched is client information.
pub fn classify_fields(
    doc_type: &str,
    original_name: &str,
    category: ServiceCategory,
    strategy: ClassificationStrategy,
) -> &'static str {
    let doc_type = doc_type.to_lowercase();
    let name = original_name.to_lowercase();
    let rules = rules_for(category);

    let folder = match strategy {
        ClassificationStrategy::FirstMatch => first_match(rules, &doc_type, &name),
        ClassificationStrategy::Scored => best_scored(rules, &doc_type, &name),
    };

    folder.unwrap_or(CLIENT_INFORMATION)
}

fn first_match(rules: &[Rule], doc_type: &str, name: &str) -> Option<&'static str> {
    rules.iter()
        .find(|r| r.pattern.is_match(doc_type) || r.pattern.is_match(name))
        .map(|r| r.folder)
}

fn best_scored(rules: &[Rule], doc_type: &str, name: &str) -> Option<&'static str> {
    // (folder, score, index of first contributing rule)
    let mut scores: Vec<(&'static str, usize, usize)> = Vec::new();

    for (idx, rule) in rules.iter().enumerate() {
        let matched: usize = [doc_type, name].iter()
            .flat_map(|field| rule.pattern.find_iter(field))
            // edge separators are part of the match but not of the keyword
            .map(|m| m.as_str().trim_matches(|c: char| !c.is_ascii_alphanumeric()).len())
            .sum();
        if matched == 0 {
            continue;
        }
        match scores.iter_mut().find(|(folder, _, _)| *folder == rule.folder) {
            Some(entry) => entry.1 += matched,
            None => scores.push((rule.folder, matched, idx)),
        }
    }

    scores.into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.2.cmp(&a.2)))
        .map(|(folder, _, _)| folder)
}

/// Documents that landed in one folder
#[derive(Debug, Clone, Serialize)]
pub struct FolderGroup {
    pub folder: Folder,
    pub documents: Vec<Document>,
}

/// Group documents under every folder of the service's taxonomy, in order.
///
/// Empty folders are kept so callers can render the full taxonomy.
pub fn group_documents(documents: &[Document], service: &str) -> Vec<FolderGroup> {
    Classifier::default().group(documents, service)
}

type CacheKey = (String, String, ServiceCategory);

/// Default number of memoised answers kept before the memo is reset
pub const DEFAULT_CACHE_LIMIT: usize = 4096;

/// Classifier with a memo of previous answers.
///
/// Classification is pure, so caching by `(doc_type, original_name, service)`
/// never changes results. The memo holds at most `cache_limit` answers and is
/// emptied when it fills up, so a long-running `watch` stays bounded.
#[derive(Debug)]
pub struct Classifier {
    strategy: ClassificationStrategy,
    cache_limit: usize,
    cache: Mutex<HashMap<CacheKey, &'static str>>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassificationStrategy::default())
    }
}

impl Classifier {
    pub fn new(strategy: ClassificationStrategy) -> Self {
        Self::with_cache_limit(strategy, DEFAULT_CACHE_LIMIT)
    }

    /// A limit of zero disables memoisation
    pub fn with_cache_limit(strategy: ClassificationStrategy, cache_limit: usize) -> Self {
        Self {
            strategy,
            cache_limit,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn strategy(&self) -> ClassificationStrategy {
        self.strategy
    }

    /// Folder for one document
    pub fn classify(&self, document: &Document, category: ServiceCategory) -> &'static str {
        let key = (
            document.doc_type.clone().unwrap_or_default(),
            document.original_name.clone(),
            category,
        );

        if let Ok(cache) = self.cache.lock() {
            if let Some(folder) = cache.get(&key) {
                return *folder;
            }
        }

        let folder = classify_fields(&key.0, &key.1, category, self.strategy);
        debug!("Classified {:?} as {}", document.original_name, folder);

        if self.cache_limit > 0 {
            if let Ok(mut cache) = self.cache.lock() {
                if cache.len() >= self.cache_limit {
                    debug!("Classifier memo full ({} entries), resetting", cache.len());
                    cache.clear();
                }
                cache.insert(key, folder);
            }
        }
        folder
    }

    /// Group documents into the taxonomy for `service`
    pub fn group(&self, documents: &[Document], service: &str) -> Vec<FolderGroup> {
        let category = ServiceCategory::from_service(service);
        let mut groups: Vec<FolderGroup> = folders_for(category)
            .into_iter()
            .map(|folder| FolderGroup { folder, documents: Vec::new() })
            .collect();

        for document in documents {
            let target = self.classify(document, category);
            // Rule targets are always taxonomy members; index 0 is the catch-all
            let idx = groups.iter()
                .position(|g| g.folder.name == target)
                .unwrap_or(0);
            groups[idx].documents.push(document.clone());
        }

        groups
    }

    /// Number of memoised answers
    pub fn cached(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}
