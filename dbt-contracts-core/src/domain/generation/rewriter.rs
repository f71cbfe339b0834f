// dbt-contracts-core/src/domain/generation/rewriter.rs
//
// Contract ids -> port names, in source definitions and in SQL bodies.
// The body rewrite is a pure textual substitution and idempotent: names that
// already are port names are never touched.

use regex::{Captures, Regex};
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use tracing::warn;

use crate::domain::generation::fragment::YamlDocument;
use crate::domain::generation::warning::GenerationWarning;
use crate::domain::odps::{DataProduct, OutputPort};

fn re_source() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(\{\{\s*source\s*\(\s*)(['"])([^'"]+)(['"])"#).unwrap_or_else(|_| {
            // hardcoded pattern, cannot fail
            Regex::new("$^").unwrap_or_else(|_| unreachable!())
        })
    })
}

fn re_ref() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(\{\{\s*ref\s*\(\s*)(['"])([^'"]+)(['"])"#)
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

/// Rename source entries called `old` to `new`. Returns how many were renamed.
pub fn rename_source(doc: &mut YamlDocument, old: &str, new: &str) -> usize {
    let Some(sources) = doc.entries_mut() else {
        return 0;
    };
    let mut renamed = 0;
    for source in sources.iter_mut().filter_map(Value::as_mapping_mut) {
        if source.get("name").and_then(Value::as_str) == Some(old) {
            source.insert("name".into(), new.into());
            renamed += 1;
        }
    }
    renamed
}

/// Rewrites the references of one output port's SQL bodies.
#[derive(Debug, Clone)]
pub struct ReferenceRewriter<'a> {
    port: &'a str,
    /// lineage contract id -> input port name, for `source()`
    sources: BTreeMap<&'a str, &'a str>,
    /// lineage contract id -> output port name, for `ref()`
    models: BTreeMap<&'a str, &'a str>,
    /// names left as they are
    port_names: BTreeSet<&'a str>,
}

impl<'a> ReferenceRewriter<'a> {
    pub fn for_port(product: &'a DataProduct, port: &'a OutputPort) -> Self {
        let mut sources = BTreeMap::new();
        let mut models = BTreeMap::new();

        for lineage in &port.input_contracts {
            let id = lineage.id.as_str();
            if let Some(input) = product.input_port_for(id) {
                sources.entry(id).or_insert(input);
            } else if let Some(output) = product
                .output_ports
                .iter()
                .find(|p| p.contract_id == id && p.name != port.name)
            {
                models.entry(id).or_insert(output.name.as_str());
            }
        }

        // the exporter points a body at its own contract id; that resolves to
        // the first declared upstream input
        if !sources.contains_key(port.contract_id.as_str())
            && let Some(first) = port
                .input_contracts
                .iter()
                .find_map(|lineage| product.input_port_for(&lineage.id))
        {
            sources.insert(port.contract_id.as_str(), first);
        }

        let port_names = product
            .input_ports
            .iter()
            .map(|p| p.name.as_str())
            .chain(product.output_ports.iter().map(|p| p.name.as_str()))
            .collect();

        Self {
            port: port.name.as_str(),
            sources,
            models,
            port_names,
        }
    }

    /// Rewrite `sql`; references outside the lineage are kept verbatim and
    /// reported once each.
    pub fn rewrite(&self, model: &str, sql: &str) -> (String, Vec<GenerationWarning>) {
        let mut unresolved = BTreeSet::new();

        let rewritten = re_source().replace_all(sql, |caps: &Captures<'_>| {
            let name = &caps[3];
            if self.port_names.contains(name) {
                return caps[0].to_string();
            }
            match self.sources.get(name) {
                Some(port_name) => replace_name(caps, port_name),
                None => {
                    unresolved.insert(name.to_string());
                    caps[0].to_string()
                }
            }
        });

        // `ref()` targets are often plain model names, only ids are rewritten
        let rewritten = re_ref().replace_all(&rewritten, |caps: &Captures<'_>| {
            let name = &caps[3];
            match self.models.get(name) {
                Some(port_name) if !self.port_names.contains(name) => {
                    replace_name(caps, port_name)
                }
                _ => caps[0].to_string(),
            }
        });

        let warnings = unresolved
            .into_iter()
            .map(|reference| {
                warn!(
                    port = self.port,
                    model,
                    reference = %reference,
                    "Reference not declared in inputContracts, left unresolved"
                );
                GenerationWarning::UnresolvedReference {
                    port: self.port.to_string(),
                    model: model.to_string(),
                    reference,
                }
            })
            .collect();

        (rewritten.into_owned(), warnings)
    }
}

fn replace_name(caps: &Captures<'_>, name: &str) -> String {
    format!("{}{}{}{}", &caps[1], &caps[2], name, &caps[4])
}
