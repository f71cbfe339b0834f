// dbt-contracts-core/src/infrastructure/config/settings.rs
//
// Every user-settable key, its type and the environment variable that
// overrides it. `config set` and the env layer both go through this table.

use std::fs;
use std::path::Path;
use tracing::info;

use crate::domain::project::Config;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Path,
    Bool,
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct Setting {
    pub key: &'static str,
    pub env: &'static str,
    pub kind: SettingKind,
    pub description: &'static str,
}

pub const SETTINGS: &[Setting] = &[
    Setting {
        key: "paths.odps_dir",
        env: "DBT_CONTRACTS_ODPS_DIR",
        kind: SettingKind::Path,
        description: "Directory holding *.odps.yaml data products",
    },
    Setting {
        key: "paths.odcs_dir",
        env: "DBT_CONTRACTS_ODCS_DIR",
        kind: SettingKind::Path,
        description: "Directory scanned for *.odcs.yaml contracts",
    },
    Setting {
        key: "paths.models_dir",
        env: "DBT_CONTRACTS_MODELS_DIR",
        kind: SettingKind::Path,
        description: "dbt models directory (schema.yml, staging/*.sql)",
    },
    Setting {
        key: "paths.sources_dir",
        env: "DBT_CONTRACTS_SOURCES_DIR",
        kind: SettingKind::Path,
        description: "Directory receiving sources.yml",
    },
    Setting {
        key: "generation.dry_run",
        env: "DBT_CONTRACTS_DRY_RUN",
        kind: SettingKind::Bool,
        description: "Plan only, never write",
    },
    Setting {
        key: "generation.merge_conflicts",
        env: "DBT_CONTRACTS_MERGE_CONFLICTS",
        kind: SettingKind::Choice(&["fail", "last-writer-wins"]),
        description: "Policy for two contracts producing the same entry",
    },
    Setting {
        key: "validation.fail_on_error",
        env: "DBT_CONTRACTS_FAIL_ON_ERROR",
        kind: SettingKind::Bool,
        description: "Stop generation when a contract fails validation",
    },
];

pub fn find(key: &str) -> Option<&'static Setting> {
    SETTINGS.iter().find(|s| s.key == key)
}

fn unknown_key(key: &str) -> InfrastructureError {
    let known: Vec<&str> = SETTINGS.iter().map(|s| s.key).collect();
    InfrastructureError::ConfigError(format!(
        "Unknown setting '{key}'. Valid keys: {}",
        known.join(", ")
    ))
}

/// Raw string -> typed TOML value for `setting`.
pub fn coerce(setting: &Setting, raw: &str) -> Result<toml::Value, InfrastructureError> {
    let raw = raw.trim();
    match setting.kind {
        SettingKind::Path => {
            if raw.is_empty() {
                return Err(InfrastructureError::ConfigError(format!(
                    "'{}' cannot be empty",
                    setting.key
                )));
            }
            Ok(toml::Value::String(raw.to_string()))
        }
        SettingKind::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(toml::Value::Boolean(true)),
            "false" | "0" | "no" | "off" => Ok(toml::Value::Boolean(false)),
            _ => Err(InfrastructureError::ConfigError(format!(
                "'{}' expects a boolean, got '{raw}'",
                setting.key
            ))),
        },
        SettingKind::Choice(choices) => {
            let normalized = raw.to_ascii_lowercase().replace('_', "-");
            if choices.contains(&normalized.as_str()) {
                Ok(toml::Value::String(normalized))
            } else {
                Err(InfrastructureError::ConfigError(format!(
                    "'{}' expects one of {choices:?}, got '{raw}'",
                    setting.key
                )))
            }
        }
    }
}

/// Set a dotted key in a TOML table, creating the section if needed.
pub fn set_in_table(
    table: &mut toml::Table,
    key: &str,
    raw: &str,
) -> Result<(), InfrastructureError> {
    let setting = find(key).ok_or_else(|| unknown_key(key))?;
    let value = coerce(setting, raw)?;

    let Some((section, field)) = setting.key.split_once('.') else {
        return Err(unknown_key(key));
    };
    let section = table
        .entry(section.to_string())
        .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    let toml::Value::Table(section) = section else {
        return Err(InfrastructureError::ConfigError(format!(
            "'{}' is not a table in the config file",
            key.split('.').next().unwrap_or(key)
        )));
    };
    section.insert(field.to_string(), value);
    Ok(())
}

pub fn table_to_config(table: toml::Table, path: &Path) -> Result<Config, InfrastructureError> {
    toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| InfrastructureError::TomlError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// `config set`: update one key of `path` (created if missing), re-validate
/// the whole document, then write it back atomically.
pub fn set_in_file(path: &Path, key: &str, raw: &str) -> Result<Config, InfrastructureError> {
    let mut table = if path.exists() {
        let content = fs::read_to_string(path)?;
        content
            .parse::<toml::Table>()
            .map_err(|e| InfrastructureError::TomlError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
    } else {
        toml::Table::new()
    };

    set_in_table(&mut table, key, raw)?;
    let config = table_to_config(table.clone(), path)?;

    let rendered = toml::to_string_pretty(&table)
        .map_err(|e| InfrastructureError::ConfigError(e.to_string()))?;
    atomic_write(path, rendered)?;
    info!(path = %path.display(), key, "Configuration updated");

    Ok(config)
}

/// Layer `DBT_CONTRACTS_*` values on top of `config`.
pub fn apply_env_overrides<F>(config: Config, lookup: F) -> Result<Config, InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    let overrides: Vec<(&Setting, String)> = SETTINGS
        .iter()
        .filter_map(|setting| lookup(setting.env).map(|value| (setting, value)))
        .collect();
    if overrides.is_empty() {
        return Ok(config);
    }

    let toml::Value::Table(mut table) = toml::Value::try_from(&config)
        .map_err(|e| InfrastructureError::ConfigError(e.to_string()))?
    else {
        return Err(InfrastructureError::ConfigError(
            "configuration did not serialize to a table".to_string(),
        ));
    };
    for (setting, value) in overrides {
        info!(env = setting.env, key = setting.key, "Overriding setting via ENV");
        set_in_table(&mut table, setting.key, &value)
            .map_err(|e| InfrastructureError::ConfigError(format!("{}: {e}", setting.env)))?;
    }
    table_to_config(table, Path::new("<environment>"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::project::ConflictPolicy;
    use anyhow::Result;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_coerce_types() {
        let dry_run = find("generation.dry_run").unwrap();
        assert_eq!(coerce(dry_run, "YES").unwrap(), toml::Value::Boolean(true));
        assert!(coerce(dry_run, "maybe").is_err());

        let policy = find("generation.merge_conflicts").unwrap();
        assert_eq!(
            coerce(policy, "last_writer_wins").unwrap(),
            toml::Value::String("last-writer-wins".to_string())
        );
        assert!(coerce(policy, "random").is_err());
    }

    #[test]
    fn test_unknown_key() {
        let mut table = toml::Table::new();
        let err = set_in_table(&mut table, "paths.nope", "x").unwrap_err();
        assert!(err.to_string().contains("paths.odps_dir"));
    }

    #[test]
    fn test_set_in_file_keeps_other_keys() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dbt-contracts.toml");
        fs::write(&path, "[paths]\nmodels_dir = \"dbt/models\"\n")?;

        let config = set_in_file(&path, "generation.dry_run", "true")?;

        assert!(config.generation.dry_run);
        assert_eq!(config.paths.models_dir, PathBuf::from("dbt/models"));
        let written = fs::read_to_string(&path)?;
        assert!(written.contains("models_dir = \"dbt/models\""));
        assert!(written.contains("dry_run = true"));
        Ok(())
    }

    #[test]
    fn test_env_overrides() -> Result<()> {
        let config = apply_env_overrides(Config::default(), |name| match name {
            "DBT_CONTRACTS_MODELS_DIR" => Some("out/models".to_string()),
            "DBT_CONTRACTS_MERGE_CONFLICTS" => Some("last-writer-wins".to_string()),
            _ => None,
        })?;
        assert_eq!(config.paths.models_dir, PathBuf::from("out/models"));
        assert_eq!(
            config.generation.merge_conflicts,
            ConflictPolicy::LastWriterWins
        );
        Ok(())
    }

    #[test]
    fn test_bad_env_value_names_the_variable() {
        let err = apply_env_overrides(Config::default(), |name| {
            (name == "DBT_CONTRACTS_DRY_RUN").then(|| "sometimes".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("DBT_CONTRACTS_DRY_RUN"));
    }
}
