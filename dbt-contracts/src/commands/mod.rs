// dbt-contracts/src/commands/mod.rs

pub mod config;
pub mod generate;
pub mod validate;

use std::path::Path;

/// `path` relative to the project directory when it lives inside it.
pub fn display_path(project_dir: &Path, path: &Path) -> String {
    path.strip_prefix(project_dir)
        .unwrap_or(path)
        .display()
        .to_string()
}
