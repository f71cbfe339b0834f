// dbt-contracts-core/src/domain/generation/sources.rs
//
// Server and SLA metadata -> source definitions (database, schema, freshness).

use serde_yaml::{Mapping, Value};
use tracing::warn;

use crate::domain::generation::fragment::YamlDocument;
use crate::domain::generation::warning::GenerationWarning;
use crate::domain::odcs::{Contract, Server, SlaProperty};

const PREFERRED_ENVIRONMENT: &str = "prod";
const DEFAULT_LOADED_AT_FIELD: &str = "_loaded_at";

pub struct SourceConfigInjector;

impl SourceConfigInjector {
    /// The `prod` server if declared, otherwise the first one.
    pub fn select_server(servers: &[Server]) -> Option<&Server> {
        servers
            .iter()
            .find(|s| s.environment.as_deref() == Some(PREFERRED_ENVIRONMENT))
            .or_else(|| servers.first())
    }

    /// Database and schema, BigQuery's project/dataset taking precedence.
    pub fn location(server: &Server) -> (Option<&str>, Option<&str>) {
        let database = server.project.as_deref().or(server.database.as_deref());
        let schema = server.dataset.as_deref().or(server.schema.as_deref());
        (database, schema)
    }

    /// `frequency` -> `warn_after`, `latency` -> `error_after`.
    pub fn freshness(
        contract: &Contract,
        warnings: &mut Vec<GenerationWarning>,
    ) -> Option<Mapping> {
        let mut freshness = Mapping::new();

        for sla in &contract.sla_properties {
            let threshold = match sla.property.to_ascii_lowercase().as_str() {
                "frequency" => "warn_after",
                "latency" => "error_after",
                _ => continue,
            };
            let Some(value) = &sla.value else {
                continue;
            };
            let Some(count) = integer(value) else {
                let rendered = render(value);
                warn!(
                    contract = contract.id_or_unknown(),
                    property = %sla.property,
                    value = %rendered,
                    "Skipping SLA property with non-integer value"
                );
                warnings.push(GenerationWarning::InvalidSla {
                    contract: contract.id_or_unknown().to_string(),
                    property: sla.property.clone(),
                    value: rendered,
                });
                continue;
            };

            let mut entry = Mapping::new();
            entry.insert("count".into(), count.into());
            entry.insert("period".into(), period(sla).into());
            freshness.insert(threshold.into(), Value::Mapping(entry));
        }

        (!freshness.is_empty()).then_some(freshness)
    }

    pub fn inject(doc: &mut YamlDocument, contract: &Contract, warnings: &mut Vec<GenerationWarning>) {
        let (database, schema) = Self::select_server(&contract.servers)
            .map(Self::location)
            .unwrap_or((None, None));
        let freshness = Self::freshness(contract, warnings);
        let loaded_at_field = contract
            .sla_default_element
            .as_deref()
            .unwrap_or(DEFAULT_LOADED_AT_FIELD);

        let Some(sources) = doc.entries_mut() else {
            return;
        };
        for source in sources.iter_mut().filter_map(Value::as_mapping_mut) {
            if let Some(database) = database {
                source.insert("database".into(), database.into());
            }
            if let Some(schema) = schema {
                source.insert("schema".into(), schema.into());
            }
            if let Some(freshness) = &freshness {
                source.insert("freshness".into(), Value::Mapping(freshness.clone()));
                source.insert("loaded_at_field".into(), loaded_at_field.into());
            }
        }
    }
}

/// Plural ODCS units become the singular periods dbt expects.
fn period(sla: &SlaProperty) -> String {
    let unit = sla.unit.as_deref().unwrap_or_default();
    match unit {
        "hours" | "hour" => "hour",
        "minutes" | "minute" => "minute",
        "days" | "day" => "day",
        "weeks" | "week" => "week",
        other => other,
    }
    .to_string()
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
