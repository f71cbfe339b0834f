// dbt-contracts/src/commands/generate.rs
//
// USE CASE: Plan every product, show the drift, write what was accepted.

use anyhow::{Context, bail};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dbt_contracts_core::application::{
    ApplyPolicy, ApplyReport, GenerationOutcome, Orchestrator, apply_plan, plan_products,
    validate_contracts,
};
use dbt_contracts_core::domain::generation::DriftStatus;
use dbt_contracts_core::infrastructure::config::LoadedConfig;
use dbt_contracts_core::infrastructure::discovery::{list_product_files, scan_contracts};
use dbt_contracts_core::infrastructure::exporter::DbtExporter;
use dbt_contracts_core::infrastructure::fs::FsStorage;
use dbt_contracts_core::infrastructure::validation::StructuralLinter;

use crate::cli::OutputFormat;
use crate::commands::display_path;

pub async fn execute(
    loaded: &LoadedConfig,
    product: Option<PathBuf>,
    dry_run: bool,
    yes: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let project_dir = loaded.project_dir.as_path();
    let mut config = loaded.config.clone();
    config.paths = config.paths.resolved_against(project_dir);
    let dry_run = dry_run || config.generation.dry_run;
    let human = format == OutputFormat::Table;

    // 1. Contract store, built once for every product
    let store = scan_contracts(&config.paths.odcs_dir).with_context(|| {
        format!(
            "Failed to load contracts from {}",
            config.paths.odcs_dir.display()
        )
    })?;
    if human {
        println!(
            "📜 Loaded {} contract(s) from {}",
            store.len(),
            display_path(project_dir, &config.paths.odcs_dir)
        );
    }

    // 2. Optional validation gate
    if config.validation.fail_on_error {
        let files: Vec<PathBuf> = store.iter().map(|stored| stored.path.clone()).collect();
        let summary = validate_contracts(&StructuralLinter, &files)?;
        if !summary.passed() {
            for failed in summary.failed() {
                eprintln!("❌ {}", display_path(project_dir, &failed.path));
                for message in &failed.report.messages {
                    eprintln!("   - {message}");
                }
            }
            bail!("Contract validation failed (validation.fail_on_error = true)");
        }
    }

    // 3. Products
    let products = match product {
        Some(path) => vec![path],
        None => list_product_files(&config.paths.odps_dir).with_context(|| {
            format!(
                "Failed to list products in {}",
                config.paths.odps_dir.display()
            )
        })?,
    };
    if products.is_empty() {
        bail!(
            "No *.odps.yaml products found in {}",
            config.paths.odps_dir.display()
        );
    }

    // 4. Plan (concurrently), then apply one product at a time
    let storage = Arc::new(FsStorage);
    let orchestrator = Orchestrator::new(
        Arc::new(store),
        Arc::new(DbtExporter::new()?),
        storage.clone(),
        &config,
    );
    let batch = plan_products(&orchestrator, products).await;

    let policy = ApplyPolicy { accept_changes: yes };
    let mut failures = 0;
    let mut report = Vec::new();

    for result in &batch.results {
        let shown = display_path(project_dir, &result.path);
        match &result.outcome {
            Ok(outcome) => {
                let applied = if dry_run {
                    None
                } else {
                    Some(apply_plan(
                        &outcome.plan,
                        storage.as_ref(),
                        storage.as_ref(),
                        policy,
                    )?)
                };
                if human {
                    print_outcome(project_dir, &shown, outcome, applied.as_ref(), dry_run);
                }
                report.push(json!({
                    "path": result.path,
                    "outcome": outcome,
                    "applied": applied,
                }));
            }
            Err(e) => {
                failures += 1;
                if human {
                    eprintln!("\n💥 {shown}: {e}");
                }
                report.push(json!({
                    "path": result.path,
                    "error": e.to_string(),
                    "empty": e.is_empty_result(),
                }));
            }
        }
    }

    if human {
        for path in &batch.overlapping {
            eprintln!(
                "⚠️  {} is generated by more than one product; the last one applied wins",
                display_path(project_dir, path)
            );
        }
    } else {
        let document = json!({
            "dry_run": dry_run,
            "products": report,
            "overlapping": batch.overlapping,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
    }

    if failures > 0 {
        bail!("{failures} product(s) failed");
    }
    if human {
        println!("\n✨ Done.");
    }
    Ok(())
}

fn print_outcome(
    project_dir: &Path,
    shown: &str,
    outcome: &GenerationOutcome,
    applied: Option<&ApplyReport>,
    dry_run: bool,
) {
    println!("\n📦 Product '{}' ({shown})", outcome.product);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![header_cell("Status"), header_cell("File")]);
    for file in &outcome.plan.files {
        table.add_row(vec![
            status_cell(file.status),
            Cell::new(display_path(project_dir, &file.path)),
        ]);
    }
    println!("{table}");

    for warning in &outcome.warnings {
        println!("   ⚠️  {warning}");
    }

    match applied {
        None if dry_run => {
            for file in outcome.plan.files.iter().filter(|f| f.status == DriftStatus::Changed) {
                if let Some(diff) = &file.diff {
                    println!("{diff}");
                }
            }
            println!("   🔍 Dry run: nothing written.");
        }
        None => {}
        Some(report) => {
            for path in &report.skipped {
                if let Some(diff) = report.diffs.get(path) {
                    println!("{diff}");
                }
                println!(
                    "   ⏭️  Skipped {} (re-run with --yes to overwrite)",
                    display_path(project_dir, path)
                );
            }
            println!(
                "   ✅ {} created, {} updated, {} unchanged",
                report.created.len(),
                report.updated.len(),
                report.unchanged.len()
            );
        }
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn status_cell(status: DriftStatus) -> Cell {
    let color = match status {
        DriftStatus::New => Color::Green,
        DriftStatus::Changed => Color::Yellow,
        DriftStatus::Unchanged => Color::DarkGrey,
    };
    Cell::new(status.to_string()).fg(color)
}
