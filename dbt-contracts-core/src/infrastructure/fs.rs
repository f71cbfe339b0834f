// dbt-contracts-core/src/infrastructure/fs.rs

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::debug;

use crate::domain::generation::GeneratedFile;
use crate::error::ContractsError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::{ArtifactSink, SnapshotSource};

/// Write `content` to `path` through a temporary file in the same directory,
/// then rename it over the target. Readers see the old file or the new one,
/// never a partial write.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // same directory, so the rename never crosses filesystems
    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(InfrastructureError::Io)?;
    temp_file
        .write_all(content.as_ref())
        .map_err(InfrastructureError::Io)?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

/// Filesystem-backed snapshot and sink. Plan paths are used as given.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl SnapshotSource for FsStorage {
    fn read(&self, path: &Path) -> Result<Option<String>, ContractsError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(InfrastructureError::Io(e).into()),
        }
    }
}

impl ArtifactSink for FsStorage {
    fn persist(&self, file: &GeneratedFile) -> Result<(), ContractsError> {
        if let Some(parent) = file.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(InfrastructureError::Io)?;
        }
        atomic_write(&file.path, &file.content)?;
        debug!(path = ?file.path, "Artifact written");
        Ok(())
    }
}
