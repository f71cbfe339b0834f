// dbt-contracts-core/src/domain/generation/mod.rs
//
// Pure pipeline stages: everything between the exporter call and the drift
// plan. No I/O happens below this module.

pub mod drift;
pub mod fragment;
pub mod merger;
pub mod metadata;
pub mod quality;
pub mod rewriter;
pub mod sources;
pub mod warning;

pub use drift::{
    DriftPlan, DriftPlanner, DriftStatus, GeneratedFile, PlannedDocument, classify,
    overlapping_paths, unified_diff,
};
pub use fragment::{Fragment, FragmentKind, YamlDocument};
pub use merger::FragmentMerger;
pub use metadata::MetadataInjector;
pub use quality::{Attachment, Conversion, QualityRuleConverter, RuleShape};
pub use rewriter::{ReferenceRewriter, rename_source};
pub use sources::SourceConfigInjector;
pub use warning::GenerationWarning;
