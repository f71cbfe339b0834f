// dbt-contracts-core/src/ports/mod.rs

// What the pipeline needs from the outside world, without knowing how it is
// done: an exporter for one contract, a validator, and read/write access to
// the artifacts already on disk.

pub mod exporter;
pub mod storage;
pub mod validator;

pub use exporter::ArtifactExporter;
pub use storage::{ArtifactSink, InMemoryStorage, SnapshotSource};
pub use validator::{ContractValidator, ValidationReport};
