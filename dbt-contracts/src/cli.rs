// dbt-contracts/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dbt-contracts")]
#[command(about = "Generate dbt sources, models and staging SQL from ODPS products and ODCS contracts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Explicit configuration file (skips the provider search)
    #[arg(long, global = true, env = "DBT_CONTRACTS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project directory
    #[arg(long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// Debug logging (RUST_LOG still wins when set)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🏗️ Plans and writes dbt artifacts for every data product
    Generate {
        /// Plan a single product file instead of the whole products directory
        #[arg(long)]
        product: Option<PathBuf>,

        /// Show the plan, write nothing
        #[arg(long)]
        dry_run: bool,

        /// Overwrite CHANGED files without asking
        #[arg(long, short)]
        yes: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// 🔎 Checks ODCS contracts
    Validate {
        /// Validate a single contract file
        #[arg(long)]
        contract: Option<PathBuf>,

        /// Validation engine
        #[arg(long, value_enum, default_value_t = Engine::Builtin)]
        engine: Engine,
    },

    /// ⚙️ Shows or edits the configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the resolved configuration as TOML
    Show,
    /// Print which provider the configuration came from
    Path,
    /// Set one key and write it back
    Set { key: String, value: String },
    /// Write the resolved configuration to a TOML file
    Export { path: PathBuf },
    /// Validate a TOML file and install it as dbt-contracts.toml
    Import { path: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Engine {
    /// Offline structural linter
    Builtin,
    /// The external `datacontract lint` command
    Datacontract,
}
