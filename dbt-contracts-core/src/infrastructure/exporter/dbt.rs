// dbt-contracts-core/src/infrastructure/exporter/dbt.rs
//
// Built-in contract -> dbt exporter. Emits, per contract, a sources document
// named after the contract id, a models document with one enforced model per
// schema object, and one staging body per schema object.

use serde::Serialize;
use tracing::debug;

use crate::domain::error::DomainError;
use crate::domain::generation::{Fragment, FragmentKind};
use crate::domain::odcs::{Contract, Property, SchemaObject};
use crate::infrastructure::exporter::template::SqlTemplate;
use crate::ports::ArtifactExporter;

// --- SERIALIZED SHAPES ---

#[derive(Serialize)]
struct SourcesFile<'a> {
    version: u8,
    sources: Vec<SourceEntry<'a>>,
}

#[derive(Serialize)]
struct SourceEntry<'a> {
    name: &'a str,
    tables: Vec<SourceTable<'a>>,
}

#[derive(Serialize)]
struct SourceTable<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    identifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    columns: Vec<Column<'a>>,
}

#[derive(Serialize)]
struct ModelsFile<'a> {
    version: u8,
    models: Vec<ModelEntry<'a>>,
}

#[derive(Serialize)]
/// No `description`: the metadata stage adds it.
struct ModelEntry<'a> {
    name: &'a str,
    config: ModelConfig<'a>,
    columns: Vec<Column<'a>>,
}

#[derive(Serialize)]
struct ModelConfig<'a> {
    meta: ModelMeta<'a>,
    materialized: &'static str,
    contract: Enforced,
}

#[derive(Serialize)]
struct ModelMeta<'a> {
    data_contract: &'a str,
}

#[derive(Serialize)]
struct Enforced {
    enforced: bool,
}

#[derive(Serialize)]
struct Column<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    constraints: Vec<Constraint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    data_tests: Vec<&'static str>,
}

#[derive(Serialize)]
struct Constraint {
    #[serde(rename = "type")]
    kind: &'static str,
}

// --- EXPORTER ---

pub struct DbtExporter {
    template: SqlTemplate<'static>,
}

impl DbtExporter {
    pub fn new() -> Result<Self, DomainError> {
        let template = SqlTemplate::new().map_err(|e| DomainError::Export {
            contract: "<template>".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { template })
    }

    fn sources(&self, id: &str, contract: &Contract) -> Result<String, DomainError> {
        let tables = named_objects(contract)
            .map(|(name, object)| SourceTable {
                name,
                identifier: object.physical_name.as_deref().filter(|p| *p != name),
                description: object.description.as_deref(),
                columns: columns(object, false),
            })
            .collect();

        let file = SourcesFile {
            version: 2,
            sources: vec![SourceEntry { name: id, tables }],
        };
        to_yaml(id, FragmentKind::SourceDefinition, &file)
    }

    fn models(&self, id: &str, contract: &Contract) -> Result<String, DomainError> {
        let models = named_objects(contract)
            .map(|(name, object)| ModelEntry {
                name,
                config: ModelConfig {
                    meta: ModelMeta { data_contract: id },
                    materialized: "table",
                    contract: Enforced { enforced: true },
                },
                columns: columns(object, true),
            })
            .collect();

        let file = ModelsFile { version: 2, models };
        to_yaml(id, FragmentKind::ModelDefinition, &file)
    }
}

impl ArtifactExporter for DbtExporter {
    fn export(&self, contract: &Contract) -> Result<Vec<Fragment>, DomainError> {
        let Some(id) = contract.id.as_deref() else {
            return Err(DomainError::Export {
                contract: contract.name.clone().unwrap_or_else(|| "<unknown>".to_string()),
                reason: "contract has no id".to_string(),
            });
        };

        let mut fragments = vec![
            Fragment::document(FragmentKind::SourceDefinition, id, self.sources(id, contract)?),
            Fragment::document(FragmentKind::ModelDefinition, id, self.models(id, contract)?),
        ];

        for (name, object) in named_objects(contract) {
            let table = object.physical_name.as_deref().unwrap_or(name);
            let column_names: Vec<&str> = object
                .properties
                .iter()
                .filter_map(|p| p.name.as_deref())
                .collect();
            let sql = self
                .template
                .render_staging(id, table, &column_names)
                .map_err(|e| DomainError::Export {
                    contract: id.to_string(),
                    reason: e.to_string(),
                })?;
            fragments.push(Fragment::body(id, name, sql));
        }

        debug!(contract = id, fragments = fragments.len(), "Contract exported");
        Ok(fragments)
    }
}

fn named_objects(contract: &Contract) -> impl Iterator<Item = (&str, &SchemaObject)> {
    contract.schema.iter().filter_map(|object| match object.name.as_deref() {
        Some(name) => Some((name, object)),
        None => {
            debug!(contract = contract.id_or_unknown(), "Skipping unnamed schema object");
            None
        }
    })
}

fn columns(object: &SchemaObject, with_constraints: bool) -> Vec<Column<'_>> {
    object
        .properties
        .iter()
        .filter_map(|property| {
            let name = property.name.as_deref()?;
            Some(Column {
                name,
                data_type: data_type(property),
                description: property.description.as_deref(),
                constraints: if with_constraints {
                    constraints(property)
                } else {
                    Vec::new()
                },
                data_tests: data_tests(property),
            })
        })
        .collect()
}

fn data_type(property: &Property) -> Option<&str> {
    property
        .physical_type
        .as_deref()
        .or(property.logical_type.as_deref())
}

fn constraints(property: &Property) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    if property.is_not_null() {
        constraints.push(Constraint { kind: "not_null" });
    }
    if property.primary_key {
        constraints.push(Constraint { kind: "primary_key" });
    } else if property.unique {
        constraints.push(Constraint { kind: "unique" });
    }
    constraints
}

fn data_tests(property: &Property) -> Vec<&'static str> {
    let mut tests = Vec::new();
    if property.is_not_null() {
        tests.push("not_null");
    }
    if property.is_unique() {
        tests.push("unique");
    }
    tests
}

fn to_yaml<T: Serialize>(id: &str, kind: FragmentKind, value: &T) -> Result<String, DomainError> {
    serde_yaml::to_string(value).map_err(|e| DomainError::Export {
        contract: id.to_string(),
        reason: format!("{kind}: {e}"),
    })
}
