// dbt-contracts-core/src/infrastructure/config/mod.rs

pub mod project;
pub mod settings;

pub use crate::domain::project::Config;
pub use project::{
    CONFIG_FILE_NAME, ConfigOrigin, LoadedConfig, export_config, import_config, load_config,
    render_config,
};
pub use settings::{SETTINGS, Setting, set_in_file};
