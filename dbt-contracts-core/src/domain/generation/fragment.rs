// dbt-contracts-core/src/domain/generation/fragment.rs

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::fmt;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FragmentKind {
    SourceDefinition,
    ModelDefinition,
    ModelBody,
}

impl FragmentKind {
    /// Top-level list key of the YAML document for this kind.
    pub fn list_key(&self) -> Option<&'static str> {
        match self {
            FragmentKind::SourceDefinition => Some("sources"),
            FragmentKind::ModelDefinition => Some("models"),
            FragmentKind::ModelBody => None,
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FragmentKind::SourceDefinition => "source-definition",
            FragmentKind::ModelDefinition => "model-definition",
            FragmentKind::ModelBody => "model-body",
        };
        f.write_str(label)
    }
}

/// Raw exporter output for one contract.
///
/// `name` is the schema object a model body was generated for; YAML
/// fragments carry `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub contract_id: String,
    pub name: Option<String>,
    pub content: String,
}

impl Fragment {
    pub fn document(kind: FragmentKind, contract_id: &str, content: impl Into<String>) -> Self {
        Self {
            kind,
            contract_id: contract_id.to_string(),
            name: None,
            content: content.into(),
        }
    }

    pub fn body(contract_id: &str, name: &str, content: impl Into<String>) -> Self {
        Self {
            kind: FragmentKind::ModelBody,
            contract_id: contract_id.to_string(),
            name: Some(name.to_string()),
            content: content.into(),
        }
    }

    /// Parse a YAML fragment into a document the injection stages can edit.
    pub fn parse(&self) -> Result<YamlDocument, DomainError> {
        let invalid = |reason: String| DomainError::InvalidFragment {
            kind: self.kind.to_string(),
            contract: self.contract_id.clone(),
            reason,
        };

        let Some(list_key) = self.kind.list_key() else {
            return Err(invalid("SQL bodies are not YAML documents".to_string()));
        };

        let value: Value =
            serde_yaml::from_str(&self.content).map_err(|e| invalid(e.to_string()))?;
        let root = match value {
            Value::Mapping(map) => map,
            // an empty export is an empty document
            Value::Null => Mapping::new(),
            _ => return Err(invalid("top level is not a mapping".to_string())),
        };

        match root.get(list_key) {
            None | Some(Value::Null) | Some(Value::Sequence(_)) => {}
            Some(_) => return Err(invalid(format!("`{list_key}` is not a list"))),
        }

        Ok(YamlDocument {
            kind: self.kind,
            contract_id: self.contract_id.clone(),
            root,
        })
    }
}

/// A parsed source/model definition document, owned by one contract.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlDocument {
    pub kind: FragmentKind,
    pub contract_id: String,
    pub root: Mapping,
}

impl YamlDocument {
    /// Entries of the top-level list (`sources` or `models`).
    pub fn entries(&self) -> &[Value] {
        self.kind
            .list_key()
            .and_then(|key| self.root.get(key))
            .and_then(Value::as_sequence)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn entries_mut(&mut self) -> Option<&mut Vec<Value>> {
        let key = self.kind.list_key()?;
        self.root.get_mut(key).and_then(Value::as_sequence_mut)
    }

    pub fn into_entries(mut self) -> Vec<Value> {
        match self.kind.list_key().and_then(|key| self.root.remove(key)) {
            Some(Value::Sequence(entries)) => entries,
            _ => Vec::new(),
        }
    }
}

// --- MAPPING HELPERS ---

pub(crate) fn entry_name(entry: &Value) -> Option<&str> {
    entry.get("name").and_then(Value::as_str)
}

pub(crate) fn find_named_mut<'a>(entries: &'a mut [Value], name: &str) -> Option<&'a mut Mapping> {
    entries
        .iter_mut()
        .find(|entry| entry_name(entry) == Some(name))
        .and_then(Value::as_mapping_mut)
}

/// Child mapping under `key`, created when absent or not a mapping.
pub(crate) fn child_mapping<'a>(map: &'a mut Mapping, key: &str) -> &'a mut Mapping {
    let slot = map
        .entry(Value::from(key))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if !slot.is_mapping() {
        *slot = Value::Mapping(Mapping::new());
    }
    match slot {
        Value::Mapping(child) => child,
        _ => unreachable!("slot was just set to a mapping"),
    }
}

/// Child sequence under `key`, created when absent or not a sequence.
pub(crate) fn child_sequence<'a>(map: &'a mut Mapping, key: &str) -> &'a mut Vec<Value> {
    let slot = map
        .entry(Value::from(key))
        .or_insert_with(|| Value::Sequence(Vec::new()));
    if !slot.is_sequence() {
        *slot = Value::Sequence(Vec::new());
    }
    match slot {
        Value::Sequence(child) => child,
        _ => unreachable!("slot was just set to a sequence"),
    }
}
