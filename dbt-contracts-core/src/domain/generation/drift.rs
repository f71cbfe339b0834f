// dbt-contracts-core/src/domain/generation/drift.rs
//
// Generated documents vs. what exists at their target paths. Pure: existing
// content comes in as a map, nothing here touches storage.

use serde::Serialize;
use similar::TextDiff;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftStatus {
    New,
    Unchanged,
    Changed,
}

impl fmt::Display for DriftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DriftStatus::New => "NEW",
            DriftStatus::Unchanged => "UNCHANGED",
            DriftStatus::Changed => "CHANGED",
        };
        f.write_str(label)
    }
}

/// Final content for one target path, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDocument {
    pub path: PathBuf,
    pub content: String,
    /// What produced it (model or document name), for error reporting.
    pub origin: String,
}

impl PlannedDocument {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>, origin: &str) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            origin: origin.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
    pub status: DriftStatus,
    /// Unified diff, only for CHANGED files.
    pub diff: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriftPlan {
    pub files: Vec<GeneratedFile>,
}

impl DriftPlan {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn get(&self, path: &Path) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn count(&self, status: DriftStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    /// True when applying the plan would write nothing.
    pub fn is_clean(&self) -> bool {
        self.files.iter().all(|f| f.status == DriftStatus::Unchanged)
    }
}

pub struct DriftPlanner;

impl DriftPlanner {
    /// Classify every document against `existing` (absent key = no file).
    ///
    /// Plan order is document order. A path produced twice is an error.
    pub fn plan(
        documents: Vec<PlannedDocument>,
        existing: &BTreeMap<PathBuf, String>,
    ) -> Result<DriftPlan, DomainError> {
        let mut origins: BTreeMap<&Path, Vec<&str>> = BTreeMap::new();
        for document in &documents {
            origins
                .entry(document.path.as_path())
                .or_default()
                .push(document.origin.as_str());
        }
        if let Some((path, models)) = origins.iter().find(|(_, models)| models.len() > 1) {
            return Err(DomainError::DuplicateTargetPath {
                path: path.display().to_string(),
                models: models.iter().map(|m| m.to_string()).collect(),
            });
        }

        let files = documents
            .into_iter()
            .map(|document| {
                let (status, diff) = classify(
                    &document.path,
                    existing.get(&document.path).map(String::as_str),
                    &document.content,
                );
                GeneratedFile {
                    path: document.path,
                    content: document.content,
                    status,
                    diff,
                }
            })
            .collect();

        Ok(DriftPlan { files })
    }
}

/// Status of `content` against what exists at `path`, with a diff when CHANGED.
pub fn classify(path: &Path, existing: Option<&str>, content: &str) -> (DriftStatus, Option<String>) {
    match existing {
        None => (DriftStatus::New, None),
        Some(old) if old == content => (DriftStatus::Unchanged, None),
        Some(old) => (DriftStatus::Changed, Some(unified_diff(path, old, content))),
    }
}

pub fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    let shown = path.display().to_string();
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{shown}"), &format!("b/{shown}"))
        .to_string()
}

/// Paths claimed by more than one plan.
pub fn overlapping_paths<'a>(plans: impl IntoIterator<Item = &'a DriftPlan>) -> Vec<PathBuf> {
    let mut seen = BTreeSet::new();
    let mut overlapping = BTreeSet::new();
    for plan in plans {
        for file in &plan.files {
            if !seen.insert(file.path.clone()) {
                overlapping.insert(file.path.clone());
            }
        }
    }
    overlapping.into_iter().collect()
}
