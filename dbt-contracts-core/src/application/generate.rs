// dbt-contracts-core/src/application/generate.rs
//
// One product in, one drift plan out. Nothing here writes: the plan goes
// back to the caller, which decides what to persist.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::domain::contract_store::ContractStore;
use crate::domain::error::DomainError;
use crate::domain::generation::{
    DriftPlan, DriftPlanner, Fragment, FragmentKind, FragmentMerger, GenerationWarning,
    MetadataInjector, PlannedDocument, QualityRuleConverter, ReferenceRewriter,
    SourceConfigInjector, YamlDocument, rename_source,
};
use crate::domain::odcs::Contract;
use crate::domain::odps::DataProduct;
use crate::domain::project::{Config, ConflictPolicy, PathsConfig};
use crate::error::ContractsError;
use crate::infrastructure::parser::load_product;
use crate::ports::{ArtifactExporter, SnapshotSource};

pub const SOURCES_FILE_NAME: &str = "sources.yml";
pub const MODELS_FILE_NAME: &str = "schema.yml";
pub const STAGING_DIR_NAME: &str = "staging";

/// Result of planning one product.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub product: String,
    pub product_path: Option<PathBuf>,
    pub plan: DriftPlan,
    pub warnings: Vec<GenerationWarning>,
}

/// Drives the stages for one product at a time.
///
/// Holds only read-only collaborators, so one instance can plan many
/// products, including from several threads.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<ContractStore>,
    exporter: Arc<dyn ArtifactExporter>,
    snapshot: Arc<dyn SnapshotSource>,
    paths: PathsConfig,
    policy: ConflictPolicy,
}

/// Output of the port stages, before merging.
#[derive(Default)]
struct Collected {
    sources: Vec<YamlDocument>,
    models: Vec<YamlDocument>,
    bodies: Vec<(String, String)>,
    warnings: Vec<GenerationWarning>,
}

impl Collected {
    fn warn(&mut self, warning: GenerationWarning) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    fn warn_all(&mut self, warnings: Vec<GenerationWarning>) {
        for warning in warnings {
            self.warn(warning);
        }
    }
}

impl Orchestrator {
    /// `config.paths` are used as given; resolve them against the project
    /// root first if they are relative.
    pub fn new(
        store: Arc<ContractStore>,
        exporter: Arc<dyn ArtifactExporter>,
        snapshot: Arc<dyn SnapshotSource>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            exporter,
            snapshot,
            paths: config.paths.clone(),
            policy: config.generation.merge_conflicts,
        }
    }

    /// Load a product file and plan it.
    pub fn plan_file(&self, path: &Path) -> Result<GenerationOutcome, ContractsError> {
        let product = load_product(path)?;
        let mut outcome = self.plan_product(&product)?;
        outcome.product_path = Some(path.to_path_buf());
        Ok(outcome)
    }

    #[instrument(skip_all, fields(product = %product.id))]
    pub fn plan_product(&self, product: &DataProduct) -> Result<GenerationOutcome, ContractsError> {
        if product.is_empty() {
            return Err(DomainError::EmptyResult {
                product: product.id.clone(),
            }
            .into());
        }

        // 1. Resolve every port up front: a missing contract aborts the product
        let inputs = self.resolve_ports(product.input_ports.iter().map(|p| p.contract_id.as_str()))?;
        let outputs =
            self.resolve_ports(product.output_ports.iter().map(|p| p.contract_id.as_str()))?;

        let mut collected = Collected::default();

        // 2. Input ports -> source definitions named after the port
        for (port, contract) in product.input_ports.iter().zip(inputs) {
            let fragments = self.exporter.export(contract)?;
            for fragment in fragments_of(&fragments, FragmentKind::SourceDefinition) {
                let mut doc = fragment.parse()?;
                rename_source(&mut doc, &port.contract_id, &port.name);
                SourceConfigInjector::inject(&mut doc, contract, &mut collected.warnings);
                collected.sources.push(doc);
            }
            warn_unnamed(contract, &mut collected);
        }

        // 3. Output ports -> model definitions and rewritten bodies
        for (port, contract) in product.output_ports.iter().zip(outputs) {
            let fragments = self.exporter.export(contract)?;

            for fragment in fragments_of(&fragments, FragmentKind::ModelDefinition) {
                let mut doc = fragment.parse()?;
                QualityRuleConverter::inject(&mut doc, contract, &mut collected.warnings);
                MetadataInjector::inject(&mut doc, contract, product);
                collected.models.push(doc);
            }

            let rewriter = ReferenceRewriter::for_port(product, port);
            for fragment in fragments_of(&fragments, FragmentKind::ModelBody) {
                let Some(model) = fragment.name.as_deref() else {
                    debug!(contract = %fragment.contract_id, "Skipping model body without a name");
                    continue;
                };
                let (sql, warnings) = rewriter.rewrite(model, &fragment.content);
                collected.warn_all(warnings);
                collected.bodies.push((model.to_string(), sql));
            }
            warn_unnamed(contract, &mut collected);
        }

        // 4. Merge and lay out target paths
        let documents = self.layout(collected.sources, collected.models, collected.bodies)?;
        if documents.is_empty() {
            return Err(DomainError::EmptyResult {
                product: product.id.clone(),
            }
            .into());
        }

        // 5. Drift against what exists today
        let mut existing = BTreeMap::new();
        for document in &documents {
            if let Some(content) = self.snapshot.read(&document.path)? {
                existing.insert(document.path.clone(), content);
            }
        }
        let plan = DriftPlanner::plan(documents, &existing)?;

        info!(
            files = plan.len(),
            warnings = collected.warnings.len(),
            "Product planned"
        );
        Ok(GenerationOutcome {
            product: product.id.clone(),
            product_path: None,
            plan,
            warnings: collected.warnings,
        })
    }

    fn resolve_ports<'a>(
        &self,
        ids: impl Iterator<Item = &'a str>,
    ) -> Result<Vec<&Contract>, DomainError> {
        ids.map(|id| self.store.resolve(id)).collect()
    }

    fn layout(
        &self,
        sources: Vec<YamlDocument>,
        models: Vec<YamlDocument>,
        bodies: Vec<(String, String)>,
    ) -> Result<Vec<PlannedDocument>, DomainError> {
        let mut documents = Vec::new();

        if !sources.is_empty() {
            let content = FragmentMerger::merge_to_string(
                FragmentKind::SourceDefinition,
                sources,
                self.policy,
                SOURCES_FILE_NAME,
            )?;
            documents.push(PlannedDocument::new(
                self.paths.sources_dir.join(SOURCES_FILE_NAME),
                content,
                SOURCES_FILE_NAME,
            ));
        }

        if !models.is_empty() {
            let content = FragmentMerger::merge_to_string(
                FragmentKind::ModelDefinition,
                models,
                self.policy,
                MODELS_FILE_NAME,
            )?;
            documents.push(PlannedDocument::new(
                self.paths.models_dir.join(MODELS_FILE_NAME),
                content,
                MODELS_FILE_NAME,
            ));
        }

        for (model, sql) in bodies {
            documents.push(PlannedDocument::new(
                self.paths
                    .models_dir
                    .join(STAGING_DIR_NAME)
                    .join(format!("stg_{model}.sql")),
                sql,
                &model,
            ));
        }

        Ok(documents)
    }
}

fn fragments_of(fragments: &[Fragment], kind: FragmentKind) -> impl Iterator<Item = &Fragment> {
    fragments.iter().filter(move |f| f.kind == kind)
}

fn warn_unnamed(contract: &Contract, collected: &mut Collected) {
    if contract.schema.iter().any(|object| object.name.is_none()) {
        collected.warn(GenerationWarning::UnnamedSchemaObject {
            contract: contract.id_or_unknown().to_string(),
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::generation::DriftStatus;
    use crate::infrastructure::exporter::DbtExporter;
    use crate::ports::{ArtifactSink, InMemoryStorage};
    use anyhow::Result;

    const CONTRACT_A: &str = r#"
kind: DataContract
id: contract-a
tags: [finance]
servers:
  - server: dev
    type: postgres
    environment: dev
    database: dev_db
    schema: raw
  - server: prod
    type: postgres
    environment: prod
    database: analytics
    schema: raw
slaDefaultElement: paid_at
slaProperties:
  - property: frequency
    value: 6
    unit: hours
schema:
  - name: payments
    properties:
      - name: payment_id
        logicalType: string
        primaryKey: true
        required: true
      - name: amount
        logicalType: number
        required: true
"#;

    const CONTRACT_B: &str = r#"
kind: DataContract
id: contract-b
description:
  purpose: Daily payment totals.
team:
  - username: jdoe
    name: Jane Doe
    role: owner
schema:
  - name: summary
    quality:
      - metric: rowCount
        mustBeGreaterThan: 0
    properties:
      - name: day
        logicalType: date
        required: true
      - name: total
        logicalType: number
        criticalDataElement: true
"#;

    const PRODUCT: &str = r#"
id: payments-product
name: Payments
domain: finance
inputPorts:
  - name: payments
    contractId: contract-a
outputPorts:
  - name: summary
    contractId: contract-b
    inputContracts:
      - id: contract-a
"#;

    /// Exporter whose body reads straight from the upstream contract id.
    struct UpstreamExporter(DbtExporter);

    impl ArtifactExporter for UpstreamExporter {
        fn export(&self, contract: &Contract) -> Result<Vec<Fragment>, DomainError> {
            let mut fragments = self.0.export(contract)?;
            for fragment in &mut fragments {
                if fragment.kind == FragmentKind::ModelBody {
                    fragment.content =
                        "select * from {{ source('contract-a', 'payments') }}\n".to_string();
                }
            }
            Ok(fragments)
        }
    }

    fn store(contracts: &[&str]) -> ContractStore {
        let mut store = ContractStore::new();
        for (index, yaml) in contracts.iter().enumerate() {
            let contract: Contract = serde_yaml::from_str(yaml).unwrap();
            store
                .insert(contract, Path::new(&format!("c{index}.odcs.yaml")))
                .unwrap();
        }
        store
    }

    fn orchestrator(
        store: ContractStore,
        exporter: Arc<dyn ArtifactExporter>,
        storage: Arc<InMemoryStorage>,
    ) -> Orchestrator {
        Orchestrator::new(Arc::new(store), exporter, storage, &Config::default())
    }

    fn product() -> DataProduct {
        serde_yaml::from_str(PRODUCT).unwrap()
    }

    #[test]
    fn test_payments_summary_scenario() -> Result<()> {
        let storage = Arc::new(InMemoryStorage::new());
        let orchestrator = orchestrator(
            store(&[CONTRACT_A, CONTRACT_B]),
            Arc::new(UpstreamExporter(DbtExporter::new()?)),
            storage,
        );

        let outcome = orchestrator.plan_product(&product())?;
        let plan = &outcome.plan;

        let paths: Vec<_> = plan.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("sources/sources.yml"),
                PathBuf::from("models/schema.yml"),
                PathBuf::from("models/staging/stg_summary.sql"),
            ]
        );
        assert_eq!(plan.count(DriftStatus::New), 3);

        // sources are keyed by port name, with prod location and freshness
        let sources: serde_yaml::Value =
            serde_yaml::from_str(&plan.get(Path::new("sources/sources.yml")).unwrap().content)?;
        let source = &sources["sources"][0];
        assert_eq!(source["name"].as_str(), Some("payments"));
        assert_eq!(source["database"].as_str(), Some("analytics"));
        assert_eq!(source["loaded_at_field"].as_str(), Some("paid_at"));
        assert_eq!(source["freshness"]["warn_after"]["period"].as_str(), Some("hour"));
        let columns = &source["tables"][0]["columns"];
        assert_eq!(columns[0]["name"].as_str(), Some("payment_id"));
        assert_eq!(columns[0]["data_tests"][0].as_str(), Some("not_null"));
        assert_eq!(columns[0]["data_tests"][1].as_str(), Some("unique"));
        assert_eq!(columns[1]["data_tests"][0].as_str(), Some("not_null"));

        // models carry the injected metadata and the converted quality rule
        let models: serde_yaml::Value =
            serde_yaml::from_str(&plan.get(Path::new("models/schema.yml")).unwrap().content)?;
        let model = &models["models"][0];
        assert_eq!(model["name"].as_str(), Some("summary"));
        assert_eq!(model["description"].as_str(), Some("Daily payment totals."));
        assert_eq!(model["config"]["meta"]["owner"].as_str(), Some("Jane Doe"));
        assert_eq!(model["config"]["meta"]["domain"].as_str(), Some("finance"));
        let row_count = &model["data_tests"][0]["dbt_expectations.expect_table_row_count_to_be_between"];
        assert_eq!(row_count["min_value"].as_i64(), Some(1));
        assert_eq!(
            model["columns"][1]["meta"]["critical_data_element"].as_bool(),
            Some(true)
        );

        let sql = &plan
            .get(Path::new("models/staging/stg_summary.sql"))
            .unwrap()
            .content;
        assert_eq!(sql, "select * from {{ source('payments', 'payments') }}\n");
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        Ok(())
    }

    #[test]
    fn test_builtin_exporter_body_points_at_upstream_port() -> Result<()> {
        let orchestrator = orchestrator(
            store(&[CONTRACT_A, CONTRACT_B]),
            Arc::new(DbtExporter::new()?),
            Arc::new(InMemoryStorage::new()),
        );

        let outcome = orchestrator.plan_product(&product())?;
        let sql = &outcome
            .plan
            .get(Path::new("models/staging/stg_summary.sql"))
            .unwrap()
            .content;
        insta::assert_snapshot!(sql, @r"
        select
            day,
            total
        from {{ source('payments', 'summary') }}
        ");
        Ok(())
    }

    #[test]
    fn test_output_without_schema_has_no_body() -> Result<()> {
        let orchestrator = orchestrator(
            store(&[CONTRACT_A, "kind: DataContract\nid: contract-b\n"]),
            Arc::new(DbtExporter::new()?),
            Arc::new(InMemoryStorage::new()),
        );

        let plan = orchestrator.plan_product(&product())?.plan;

        assert_eq!(plan.len(), 2);
        let models = &plan.get(Path::new("models/schema.yml")).unwrap().content;
        assert_eq!(models, "version: 2\nmodels: []\n");
        assert!(plan.files.iter().all(|f| f.path.extension().unwrap() == "yml"));
        Ok(())
    }

    #[test]
    fn test_second_run_is_unchanged() -> Result<()> {
        let storage = Arc::new(InMemoryStorage::new());
        let orchestrator = orchestrator(
            store(&[CONTRACT_A, CONTRACT_B]),
            Arc::new(DbtExporter::new()?),
            storage.clone(),
        );

        let first = orchestrator.plan_product(&product())?;
        for file in &first.plan.files {
            storage.persist(file)?;
        }

        let second = orchestrator.plan_product(&product())?;
        assert!(second.plan.is_clean());
        assert_eq!(second.plan.count(DriftStatus::Unchanged), 3);
        Ok(())
    }

    #[test]
    fn test_description_change_only_touches_schema() -> Result<()> {
        let storage = Arc::new(InMemoryStorage::new());
        let first = orchestrator(
            store(&[CONTRACT_A, CONTRACT_B]),
            Arc::new(DbtExporter::new()?),
            storage.clone(),
        )
        .plan_product(&product())?;
        for file in &first.plan.files {
            storage.persist(file)?;
        }

        let edited = CONTRACT_B.replace("Daily payment totals.", "Daily totals in EUR.");
        let second = orchestrator(
            store(&[CONTRACT_A, edited.as_str()]),
            Arc::new(DbtExporter::new()?),
            storage,
        )
        .plan_product(&product())?;

        assert_eq!(second.plan.count(DriftStatus::Changed), 1);
        assert_eq!(second.plan.count(DriftStatus::Unchanged), 2);
        let changed = second.plan.get(Path::new("models/schema.yml")).unwrap();
        assert_eq!(changed.status, DriftStatus::Changed);
        let diff = changed.diff.as_deref().unwrap();
        assert!(diff.contains("-  description: Daily payment totals."));
        assert!(diff.contains("+  description: Daily totals in EUR."));
        Ok(())
    }

    #[test]
    fn test_unknown_contract_aborts() -> Result<()> {
        let orchestrator = orchestrator(
            store(&[CONTRACT_A]),
            Arc::new(DbtExporter::new()?),
            Arc::new(InMemoryStorage::new()),
        );

        let err = orchestrator.plan_product(&product()).unwrap_err();
        assert!(matches!(
            err,
            ContractsError::Domain(DomainError::ContractNotFound { ref id }) if id == "contract-b"
        ));
        Ok(())
    }

    #[test]
    fn test_product_without_ports_is_empty_result() -> Result<()> {
        let orchestrator = orchestrator(
            ContractStore::new(),
            Arc::new(DbtExporter::new()?),
            Arc::new(InMemoryStorage::new()),
        );
        let product: DataProduct = serde_yaml::from_str("id: bare\nname: Bare\n")?;

        let err = orchestrator.plan_product(&product).unwrap_err();
        assert!(err.is_empty_result());
        Ok(())
    }

    #[test]
    fn test_unresolved_reference_is_a_warning() -> Result<()> {
        let orchestrator = orchestrator(
            store(&[CONTRACT_A, CONTRACT_B]),
            Arc::new(DbtExporter::new()?),
            Arc::new(InMemoryStorage::new()),
        );
        let mut product = product();
        product.output_ports[0].input_contracts.clear();

        let outcome = orchestrator.plan_product(&product)?;

        assert_eq!(outcome.plan.len(), 3);
        assert_eq!(
            outcome.warnings,
            vec![GenerationWarning::UnresolvedReference {
                port: "summary".to_string(),
                model: "summary".to_string(),
                reference: "contract-b".to_string(),
            }]
        );
        Ok(())
    }

    #[test]
    fn test_same_model_from_two_ports_conflicts() -> Result<()> {
        let twin = CONTRACT_B.replace("id: contract-b", "id: contract-c");
        let orchestrator = orchestrator(
            store(&[CONTRACT_A, CONTRACT_B, twin.as_str()]),
            Arc::new(DbtExporter::new()?),
            Arc::new(InMemoryStorage::new()),
        );
        let mut product = product();
        let mut second = product.output_ports[0].clone();
        second.name = "summary_copy".to_string();
        second.contract_id = "contract-c".to_string();
        product.output_ports.push(second);

        let err = orchestrator.plan_product(&product).unwrap_err();
        assert!(matches!(
            err,
            ContractsError::Domain(DomainError::MergeConflict { .. })
        ));
        Ok(())
    }
}
