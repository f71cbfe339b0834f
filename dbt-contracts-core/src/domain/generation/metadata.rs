// dbt-contracts-core/src/domain/generation/metadata.rs
//
// Contract/product metadata -> model definitions. Every key is add-only:
// whatever the export stage already wrote is kept.

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::domain::generation::fragment::{YamlDocument, child_mapping, find_named_mut};
use crate::domain::odcs::{Contract, Property};
use crate::domain::odps::DataProduct;

pub struct MetadataInjector;

impl MetadataInjector {
    /// Purpose, then limitations, then usage, each only when non-empty.
    pub fn compose_description(contract: &Contract) -> Option<String> {
        let description = contract.description.as_ref()?;
        let non_empty = |field: &Option<String>| {
            field
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        };

        let mut parts = Vec::new();
        if let Some(purpose) = non_empty(&description.purpose) {
            parts.push(purpose);
        }
        if let Some(limitations) = non_empty(&description.limitations) {
            parts.push(format!("**Limitations:** {limitations}"));
        }
        if let Some(usage) = non_empty(&description.usage) {
            parts.push(format!("**Usage:** {usage}"));
        }

        (!parts.is_empty()).then(|| parts.join("\n\n"))
    }

    /// Product tags then contract tags, first occurrence wins.
    pub fn merged_tags(product: &DataProduct, contract: &Contract) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in product.tags.iter().chain(contract.tags.iter()) {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        tags
    }

    pub fn inject(doc: &mut YamlDocument, contract: &Contract, product: &DataProduct) {
        let Some(models) = doc.entries_mut() else {
            return;
        };

        let tags = Self::merged_tags(product, contract);
        let description = Self::compose_description(contract);
        let owner = contract.team.as_ref().and_then(|team| team.owner());
        let domain = product.domain.as_deref();

        for object in &contract.schema {
            let Some(model_name) = object.name.as_deref() else {
                continue;
            };
            let Some(model) = find_named_mut(models, model_name) else {
                debug!(
                    model = model_name,
                    contract = contract.id_or_unknown(),
                    "No model definition for schema object"
                );
                continue;
            };
            debug!(
                model = model_name,
                contract = contract.id_or_unknown(),
                "Injecting metadata"
            );

            // --- Tags ---
            if !tags.is_empty() {
                merge_tags(model, &tags);
            }

            // --- Description ---
            // contract-level text first, then the schema object's own
            if let Some(text) = description.as_deref().or(object.description.as_deref()) {
                insert_absent(model, "description", text.into());
            }

            // --- Model meta ---
            if owner.is_some() || domain.is_some() {
                let meta = child_mapping(child_mapping(model, "config"), "meta");
                if let Some(owner) = owner {
                    insert_absent(meta, "owner", owner.into());
                }
                if let Some(domain) = domain {
                    insert_absent(meta, "domain", domain.into());
                }
            }

            // --- Column meta ---
            let Some(columns) = model.get_mut("columns").and_then(Value::as_sequence_mut) else {
                continue;
            };
            for property in &object.properties {
                let Some(column_name) = property.name.as_deref() else {
                    continue;
                };
                if let Some(column) = find_named_mut(columns, column_name) {
                    inject_column_meta(column, property);
                }
            }
        }
    }
}

fn merge_tags(model: &mut Mapping, tags: &[String]) {
    let mut current = match model.get("tags") {
        Some(Value::Sequence(existing)) => existing.clone(),
        // a single-string `tags:` is valid dbt
        Some(Value::String(single)) => vec![Value::from(single.as_str())],
        None | Some(Value::Null) => Vec::new(),
        Some(_) => return,
    };
    for tag in tags {
        let tag = Value::from(tag.as_str());
        if !current.contains(&tag) {
            current.push(tag);
        }
    }
    model.insert("tags".into(), Value::Sequence(current));
}

fn inject_column_meta(column: &mut Mapping, property: &Property) {
    if property.critical_data_element.is_none() && property.business_name.is_none() {
        return;
    }
    let meta = child_mapping(column, "meta");
    if let Some(critical) = property.critical_data_element {
        insert_absent(meta, "critical_data_element", critical.into());
    }
    if let Some(business_name) = &property.business_name {
        insert_absent(meta, "business_name", business_name.as_str().into());
    }
}

fn insert_absent(map: &mut Mapping, key: &str, value: Value) {
    if !map.contains_key(key) {
        map.insert(key.into(), value);
    }
}
