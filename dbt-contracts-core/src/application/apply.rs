// dbt-contracts-core/src/application/apply.rs
//
// A plan can be stale by the time it is applied: another product sharing a
// target path may have written it since. Each file is re-classified against
// storage right before the write, and the consent rule follows that status.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::domain::generation::{DriftPlan, DriftStatus, classify};
use crate::error::ContractsError;
use crate::ports::{ArtifactSink, SnapshotSource};

/// What the caller agreed to write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyPolicy {
    /// Overwrite CHANGED files. NEW files are always written.
    pub accept_changes: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub created: Vec<PathBuf>,
    pub updated: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    /// CHANGED files left alone because the policy did not accept them.
    pub skipped: Vec<PathBuf>,
    /// Diff against the current content, for every skipped file.
    pub diffs: BTreeMap<PathBuf, String>,
}

impl ApplyReport {
    pub fn written(&self) -> usize {
        self.created.len() + self.updated.len()
    }
}

/// Persist the accepted part of `plan` through `sink`, in plan order.
///
/// Stops at the first failing write; files written before it stay written.
pub fn apply_plan(
    plan: &DriftPlan,
    snapshot: &dyn SnapshotSource,
    sink: &dyn ArtifactSink,
    policy: ApplyPolicy,
) -> Result<ApplyReport, ContractsError> {
    let mut report = ApplyReport::default();

    for file in &plan.files {
        let current = snapshot.read(&file.path)?;
        let (status, diff) = classify(&file.path, current.as_deref(), &file.content);
        if status != file.status {
            debug!(
                path = %file.path.display(),
                planned = %file.status,
                now = %status,
                "Target changed since planning"
            );
        }

        match status {
            DriftStatus::New => {
                sink.persist(file)?;
                report.created.push(file.path.clone());
            }
            DriftStatus::Changed if policy.accept_changes => {
                sink.persist(file)?;
                report.updated.push(file.path.clone());
            }
            DriftStatus::Changed => {
                debug!(path = %file.path.display(), "Change not accepted, skipping");
                if let Some(diff) = diff {
                    report.diffs.insert(file.path.clone(), diff);
                }
                report.skipped.push(file.path.clone());
            }
            DriftStatus::Unchanged => report.unchanged.push(file.path.clone()),
        }
    }

    info!(
        created = report.created.len(),
        updated = report.updated.len(),
        skipped = report.skipped.len(),
        "Plan applied"
    );
    Ok(report)
}
