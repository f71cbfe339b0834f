// dbt-contracts-core/src/ports/storage.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domain::generation::GeneratedFile;
use crate::error::ContractsError;

/// Reads what currently exists at a target path.
pub trait SnapshotSource: Send + Sync {
    /// `None` when nothing exists at `path`.
    fn read(&self, path: &Path) -> Result<Option<String>, ContractsError>;
}

/// Persists one accepted file of a plan.
pub trait ArtifactSink: Send + Sync {
    fn persist(&self, file: &GeneratedFile) -> Result<(), ContractsError>;
}

/// Map-backed storage, used as both snapshot and sink.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.into(), content.into());
        }
        self
    }

    pub fn files(&self) -> BTreeMap<PathBuf, String> {
        self.files
            .lock()
            .map(|files| files.clone())
            .unwrap_or_default()
    }
}

impl SnapshotSource for InMemoryStorage {
    fn read(&self, path: &Path) -> Result<Option<String>, ContractsError> {
        let files = self
            .files
            .lock()
            .map_err(|e| ContractsError::InternalError(e.to_string()))?;
        Ok(files.get(path).cloned())
    }
}

impl ArtifactSink for InMemoryStorage {
    fn persist(&self, file: &GeneratedFile) -> Result<(), ContractsError> {
        let mut files = self
            .files
            .lock()
            .map_err(|e| ContractsError::InternalError(e.to_string()))?;
        files.insert(file.path.clone(), file.content.clone());
        Ok(())
    }
}
