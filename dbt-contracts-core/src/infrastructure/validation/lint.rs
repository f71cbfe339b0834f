// dbt-contracts-core/src/infrastructure/validation/lint.rs
//
// Offline structural checks on one ODCS file: the properties generation
// relies on, not the full standard.

use std::collections::HashSet;
use std::path::Path;

use crate::domain::generation::RuleShape;
use crate::domain::odcs::{Contract, QualityRule};
use crate::error::ContractsError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::parser::load_contract;
use crate::ports::{ContractValidator, ValidationReport};

const EXPECTED_KIND: &str = "DataContract";

#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralLinter;

impl StructuralLinter {
    pub fn lint(&self, contract: &Contract) -> Vec<String> {
        let mut messages = Vec::new();

        if contract.id.as_deref().is_none_or(str::is_empty) {
            messages.push("missing `id`".to_string());
        }
        match contract.kind.as_deref() {
            Some(EXPECTED_KIND) => {}
            Some(other) => messages.push(format!("`kind` is '{other}', expected '{EXPECTED_KIND}'")),
            None => messages.push(format!("missing `kind` (expected '{EXPECTED_KIND}')")),
        }

        let mut objects = HashSet::new();
        for (index, object) in contract.schema.iter().enumerate() {
            let Some(name) = object.name.as_deref() else {
                messages.push(format!("schema[{index}]: missing `name`"));
                continue;
            };
            if !objects.insert(name) {
                messages.push(format!("schema object '{name}' is declared twice"));
            }

            lint_rules(&object.quality, &format!("schema '{name}'"), true, &mut messages);

            let mut properties = HashSet::new();
            for (p_index, property) in object.properties.iter().enumerate() {
                let Some(p_name) = property.name.as_deref() else {
                    messages.push(format!("schema '{name}', property[{p_index}]: missing `name`"));
                    continue;
                };
                if !properties.insert(p_name) {
                    messages.push(format!("schema '{name}': property '{p_name}' is declared twice"));
                }
                lint_rules(
                    &property.quality,
                    &format!("property '{name}.{p_name}'"),
                    false,
                    &mut messages,
                );
            }
        }

        messages
    }
}

fn lint_rules(rules: &[QualityRule], target: &str, table_level: bool, messages: &mut Vec<String>) {
    for rule in rules {
        match RuleShape::of(rule) {
            None => messages.push(format!(
                "{target}: quality rule '{}' has no dbt mapping",
                rule.label()
            )),
            Some(RuleShape::Expression) if rule.query.is_none() => {
                messages.push(format!("{target}: sql rule '{}' has no `query`", rule.label()));
            }
            Some(RuleShape::PassThrough) if rule.implementation.is_none() => messages.push(format!(
                "{target}: custom rule '{}' has no `implementation`",
                rule.label()
            )),
            Some(RuleShape::NotNull | RuleShape::Unique) if table_level => messages.push(format!(
                "{target}: column metric '{}' declared at table level",
                rule.label()
            )),
            Some(_) => {}
        }
    }
}

impl ContractValidator for StructuralLinter {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn validate(&self, path: &Path) -> Result<ValidationReport, ContractsError> {
        match load_contract(path) {
            Ok(contract) => Ok(ValidationReport::from_messages(self.lint(&contract))),
            // unparsable is a failed contract, not a failed check
            Err(e @ InfrastructureError::Document { .. }) => {
                Ok(ValidationReport::from_messages(vec![e.to_string()]))
            }
            Err(e) => Err(e.into()),
        }
    }
}
