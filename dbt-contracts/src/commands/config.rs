// dbt-contracts/src/commands/config.rs
//
// USE CASE: Inspect and edit the resolved configuration.

use anyhow::Context;

use dbt_contracts_core::infrastructure::config::settings::find;
use dbt_contracts_core::infrastructure::config::{
    CONFIG_FILE_NAME, ConfigOrigin, LoadedConfig, SETTINGS, export_config, import_config,
    render_config, set_in_file,
};

use crate::cli::ConfigAction;

pub fn execute(loaded: &LoadedConfig, action: Option<ConfigAction>) -> anyhow::Result<()> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            println!("# Source: {}", loaded.origin);
            print!("{}", render_config(&loaded.config)?);
        }
        ConfigAction::Path => {
            match &loaded.origin {
                ConfigOrigin::Defaults => println!("⚙️  No configuration file, using built-in defaults"),
                origin => println!("⚙️  {origin}"),
            }
            println!("   `config set` writes to {}", loaded.writable_path().display());
        }
        ConfigAction::Set { key, value } => {
            if find(&key).is_none() {
                eprintln!("Valid keys:");
                for setting in SETTINGS {
                    eprintln!("   {:<28} {} (env {})", setting.key, setting.description, setting.env);
                }
            }
            let path = loaded.writable_path();
            set_in_file(&path, &key, &value)
                .with_context(|| format!("Failed to update {}", path.display()))?;
            println!("✅ {key} = {value} written to {}", path.display());
        }
        ConfigAction::Export { path } => {
            export_config(&loaded.config, &path)
                .with_context(|| format!("Failed to export to {}", path.display()))?;
            println!("📤 Configuration exported to {}", path.display());
        }
        ConfigAction::Import { path } => {
            let target = loaded.project_dir.join(CONFIG_FILE_NAME);
            import_config(&path, &target)
                .with_context(|| format!("Failed to import {}", path.display()))?;
            println!("📥 Imported {} into {}", path.display(), target.display());
        }
    }
    Ok(())
}
