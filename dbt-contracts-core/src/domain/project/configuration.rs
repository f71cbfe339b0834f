// dbt-contracts-core/src/domain/project/configuration.rs

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the merger treats two fragments producing the same entry key.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    #[default]
    Fail,
    LastWriterWins,
}

impl ConflictPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::Fail => "fail",
            ConflictPolicy::LastWriterWins => "last-writer-wins",
        }
    }
}

/// Resolved configuration, immutable once loaded.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    #[serde(default = "default_odps_dir")]
    pub odps_dir: PathBuf,
    #[serde(default = "default_odcs_dir")]
    pub odcs_dir: PathBuf,
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,
    #[serde(default = "default_sources_dir")]
    pub sources_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            odps_dir: default_odps_dir(),
            odcs_dir: default_odcs_dir(),
            models_dir: default_models_dir(),
            sources_dir: default_sources_dir(),
        }
    }
}

impl PathsConfig {
    /// Same paths anchored at `root` (absolute paths are kept as-is).
    pub fn resolved_against(&self, root: &Path) -> Self {
        Self {
            odps_dir: root.join(&self.odps_dir),
            odcs_dir: root.join(&self.odcs_dir),
            models_dir: root.join(&self.models_dir),
            sources_dir: root.join(&self.sources_dir),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub merge_conflicts: ConflictPolicy,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    #[serde(default)]
    pub fail_on_error: bool,
}

fn default_odps_dir() -> PathBuf {
    PathBuf::from("contracts/products")
}
fn default_odcs_dir() -> PathBuf {
    PathBuf::from("contracts/schemas")
}
fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}
fn default_sources_dir() -> PathBuf {
    PathBuf::from("sources")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.paths.odcs_dir, PathBuf::from("contracts/schemas"));
        assert_eq!(config.generation.merge_conflicts, ConflictPolicy::Fail);
    }

    #[test]
    fn test_partial_document() {
        let config: Config = toml::from_str(
            r#"
[paths]
models_dir = "dbt/models"

[generation]
merge_conflicts = "last-writer-wins"
"#,
        )
        .unwrap();
        assert_eq!(config.paths.models_dir, PathBuf::from("dbt/models"));
        assert_eq!(config.paths.sources_dir, PathBuf::from("sources"));
        assert_eq!(
            config.generation.merge_conflicts,
            ConflictPolicy::LastWriterWins
        );
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(toml::from_str::<Config>("[paths]\nmodel_dir = \"x\"\n").is_err());
        assert!(toml::from_str::<Config>("[output]\nx = 1\n").is_err());
    }
}
