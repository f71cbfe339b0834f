// dbt-contracts-core/src/ports/exporter.rs

use crate::domain::error::DomainError;
use crate::domain::generation::Fragment;
use crate::domain::odcs::Contract;

/// Turns one contract into raw dbt fragments.
///
/// Implementations must be pure: same contract, same fragments. Model bodies
/// carry the schema object they were generated for in `Fragment::name`.
pub trait ArtifactExporter: Send + Sync {
    fn export(&self, contract: &Contract) -> Result<Vec<Fragment>, DomainError>;
}
