use anyhow::{Context, Result};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A throwaway copy of the fixture project.
struct ProjectEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl ProjectEnv {
    fn new() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("payments_project");

        let dest = tmp.path().join("payments_project");
        Self::copy_dir(&fixture, &dest)?;

        Ok(Self {
            _tmp: tmp,
            root: dest,
        })
    }

    fn copy_dir(src: &Path, dst: &Path) -> std::io::Result<()> {
        let mut options = fs_extra::dir::CopyOptions::new();
        options.content_only = true;

        fs::create_dir_all(dst)?;
        fs_extra::dir::copy(src, dst, &options)
            .map(|_| ())
            .map_err(|e| std::io::Error::other(e.to_string()))
    }

    fn cli(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dbt-contracts"));
        cmd.current_dir(&self.root);
        cmd.env_remove("RUST_LOG");
        for var in [
            "DBT_CONTRACTS_CONFIG",
            "DBT_CONTRACTS_DRY_RUN",
            "DBT_CONTRACTS_MODELS_DIR",
            "DBT_CONTRACTS_SOURCES_DIR",
            "DBT_CONTRACTS_MERGE_CONFLICTS",
            "DBT_CONTRACTS_FAIL_ON_ERROR",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }

    fn read(&self, relative: &str) -> Result<String> {
        fs::read_to_string(self.root.join(relative)).with_context(|| format!("reading {relative}"))
    }

    fn generated_files(&self) -> Vec<String> {
        let mut files: Vec<String> = walkdir::WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.root)
                    .ok()
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
            })
            .filter(|p| !p.starts_with("contracts/"))
            .collect();
        files.sort();
        files
    }
}

#[test]
fn test_generate_writes_all_artifacts() -> Result<()> {
    let env = ProjectEnv::new()?;

    env.cli()
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("NEW"))
        .stdout(predicate::str::contains("3 created"));

    assert_eq!(
        env.generated_files(),
        vec![
            "models/schema.yml",
            "models/staging/stg_summary.sql",
            "sources/sources.yml",
        ]
    );

    let sources: serde_yaml::Value = serde_yaml::from_str(&env.read("sources/sources.yml")?)?;
    let source = &sources["sources"][0];
    assert_eq!(source["name"].as_str(), Some("payments"));
    assert_eq!(source["database"].as_str(), Some("analytics"));
    assert_eq!(source["freshness"]["error_after"]["count"].as_i64(), Some(2));
    assert_eq!(source["freshness"]["error_after"]["period"].as_str(), Some("day"));

    let models: serde_yaml::Value = serde_yaml::from_str(&env.read("models/schema.yml")?)?;
    let model = &models["models"][0];
    assert_eq!(model["name"].as_str(), Some("summary"));
    assert_eq!(model["config"]["meta"]["owner"].as_str(), Some("Jane Doe"));
    assert_eq!(
        model["description"].as_str(),
        Some("Daily payment totals.\n\n**Usage:** Finance dashboards.")
    );

    insta::assert_snapshot!(env.read("models/staging/stg_summary.sql")?, @r"
    select
        day,
        total
    from {{ source('payments', 'summary') }}
    ");
    Ok(())
}

#[test]
fn test_second_run_is_unchanged() -> Result<()> {
    let env = ProjectEnv::new()?;
    env.cli().arg("generate").assert().success();

    env.cli()
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 created, 0 updated, 3 unchanged"));
    Ok(())
}

#[test]
fn test_dry_run_writes_nothing() -> Result<()> {
    let env = ProjectEnv::new()?;

    env.cli()
        .args(["generate", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert!(env.generated_files().is_empty());
    Ok(())
}

#[test]
fn test_changed_file_needs_consent() -> Result<()> {
    let env = ProjectEnv::new()?;
    env.cli().arg("generate").assert().success();
    let before = env.read("models/schema.yml")?;

    let contract = env.root.join("contracts/schemas/summary.odcs.yaml");
    let edited = fs::read_to_string(&contract)?.replace("Daily payment totals.", "Daily totals.");
    fs::write(&contract, edited)?;

    env.cli()
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("CHANGED"))
        .stdout(predicate::str::contains("Daily totals."))
        .stdout(predicate::str::contains("Skipped models/schema.yml"));
    assert_eq!(env.read("models/schema.yml")?, before);

    env.cli()
        .args(["generate", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 updated, 2 unchanged"));
    assert!(env.read("models/schema.yml")?.contains("Daily totals."));
    Ok(())
}

#[test]
fn test_shared_target_is_not_overwritten_without_consent() -> Result<()> {
    let env = ProjectEnv::new()?;
    // sorts before payments.odps.yaml, so it is applied first
    fs::write(
        env.root.join("contracts/products/audit.odps.yaml"),
        "id: audit-product\nname: Audit\ninputPorts:\n  - name: raw_payments\n    contractId: contract-a\n",
    )?;

    env.cli()
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped sources/sources.yml"))
        .stderr(predicate::str::contains("generated by more than one product"));

    let sources: serde_yaml::Value = serde_yaml::from_str(&env.read("sources/sources.yml")?)?;
    let names: Vec<_> = sources["sources"]
        .as_sequence()
        .context("sources list")?
        .iter()
        .filter_map(|source| source["name"].as_str())
        .collect();
    assert_eq!(names, vec!["raw_payments"]);
    assert!(env.root.join("models/schema.yml").is_file());
    Ok(())
}

#[test]
fn test_json_report() -> Result<()> {
    let env = ProjectEnv::new()?;

    let output = env
        .cli()
        .args(["generate", "--dry-run", "--format", "json"])
        .output()?;
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["dry_run"], serde_json::Value::Bool(true));
    let files = report["products"][0]["outcome"]["plan"]["files"]
        .as_array()
        .context("files array")?;
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| f["status"] == "new"));
    Ok(())
}

#[test]
fn test_missing_contract_fails() -> Result<()> {
    let env = ProjectEnv::new()?;
    fs::remove_file(env.root.join("contracts/schemas/summary.odcs.yaml"))?;

    env.cli()
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("contract-b"));
    assert!(env.generated_files().is_empty());
    Ok(())
}

#[test]
fn test_validate_fixture_contracts() -> Result<()> {
    let env = ProjectEnv::new()?;

    env.cli()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 contract(s) valid"));

    fs::write(
        env.root.join("contracts/schemas/broken.odcs.yaml"),
        "kind: DataContract\nschema:\n  - name: t\n    quality:\n      - metric: nullValues\n",
    )?;
    env.cli()
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("missing `id`"))
        .stdout(predicate::str::contains("declared at table level"));
    Ok(())
}

#[test]
fn test_config_set_then_show() -> Result<()> {
    let env = ProjectEnv::new()?;

    env.cli()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("built-in defaults"));

    env.cli()
        .args(["config", "set", "paths.models_dir", "dbt/models"])
        .assert()
        .success();
    assert!(env.read("dbt-contracts.toml")?.contains("models_dir = \"dbt/models\""));

    env.cli()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("models_dir = \"dbt/models\""));

    env.cli()
        .args(["config", "set", "paths.nope", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown setting"));
    Ok(())
}

#[test]
fn test_config_export_then_import() -> Result<()> {
    let env = ProjectEnv::new()?;

    env.cli()
        .args(["config", "export", "shared.toml"])
        .env("DBT_CONTRACTS_SOURCES_DIR", "dbt/sources")
        .assert()
        .success();
    let exported = env.read("shared.toml")?;
    assert!(exported.contains("sources_dir = \"dbt/sources\""));
    assert!(!env.root.join("dbt-contracts.toml").exists());

    env.cli()
        .args(["config", "import", "shared.toml"])
        .assert()
        .success();
    let imported = env.read("dbt-contracts.toml")?;
    assert!(imported.contains("sources_dir = \"dbt/sources\""));

    fs::write(env.root.join("broken.toml"), "[paths]\nnope = 1\n")?;
    env.cli()
        .args(["config", "import", "broken.toml"])
        .assert()
        .failure();
    assert_eq!(env.read("dbt-contracts.toml")?, imported);
    Ok(())
}

#[test]
fn test_env_override_redirects_output() -> Result<()> {
    let env = ProjectEnv::new()?;

    env.cli()
        .arg("generate")
        .env("DBT_CONTRACTS_MODELS_DIR", "out/models")
        .assert()
        .success();

    assert!(env.root.join("out/models/schema.yml").is_file());
    assert!(!env.root.join("models").exists());
    Ok(())
}
