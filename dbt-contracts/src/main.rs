// dbt-contracts/src/main.rs

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use dbt_contracts_core::infrastructure::config::load_config;

mod cli;
mod commands;

use cli::{Cli, Commands};

/// `RUST_LOG` wins; otherwise WARN, or DEBUG with `--verbose`.
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_str().to_lowercase();
        EnvFilter::new(format!(
            "{level},dbt_contracts={level},dbt_contracts_core={level}"
        ))
    });

    // stderr keeps `--format json` output parseable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // 1. Configuration is resolved once and passed down
    let loaded = load_config(&cli.project_dir, cli.config.as_deref())?;

    // 2. Dispatch
    match cli.command {
        Commands::Generate {
            product,
            dry_run,
            yes,
            format,
        } => {
            commands::generate::execute(&loaded, product, dry_run, yes, format).await?;
        }
        Commands::Validate { contract, engine } => {
            commands::validate::execute(&loaded, contract, engine)?;
        }
        Commands::Config { action } => {
            commands::config::execute(&loaded, action)?;
        }
    }

    Ok(())
}
