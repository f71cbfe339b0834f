// dbt-contracts-core/src/domain/generation/merger.rs

use serde_yaml::{Mapping, Value};
use tracing::warn;

use crate::domain::error::DomainError;
use crate::domain::generation::fragment::{FragmentKind, YamlDocument, entry_name};
use crate::domain::project::ConflictPolicy;

/// dbt property files are version 2.
pub const DOCUMENT_VERSION: u64 = 2;

pub struct FragmentMerger;

impl FragmentMerger {
    /// Combine documents of one kind into `{version: 2, <list key>: [...]}`.
    ///
    /// Entries keep the order of `documents`, then their order inside each
    /// document. Two entries with the same `name` are a conflict: an error
    /// under [`ConflictPolicy::Fail`], the later one replacing the earlier in
    /// place under [`ConflictPolicy::LastWriterWins`].
    pub fn merge(
        kind: FragmentKind,
        documents: Vec<YamlDocument>,
        policy: ConflictPolicy,
        document_name: &str,
    ) -> Result<Mapping, DomainError> {
        let Some(list_key) = kind.list_key() else {
            return Err(DomainError::InvalidFragment {
                kind: kind.to_string(),
                contract: document_name.to_string(),
                reason: "only YAML documents can be merged".to_string(),
            });
        };

        // (entry key, owning contract, entry)
        let mut merged: Vec<(Option<String>, String, Value)> = Vec::new();

        for document in documents {
            if document.kind != kind {
                return Err(DomainError::InvalidFragment {
                    kind: document.kind.to_string(),
                    contract: document.contract_id.clone(),
                    reason: format!("cannot be merged into {document_name}"),
                });
            }
            let contract_id = document.contract_id.clone();

            for entry in document.into_entries() {
                let key = entry_name(&entry).map(str::to_string);
                let existing = key
                    .as_ref()
                    .and_then(|k| merged.iter().position(|(other, _, _)| other.as_ref() == Some(k)));

                match (existing, policy) {
                    (None, _) => merged.push((key, contract_id.clone(), entry)),
                    (Some(index), ConflictPolicy::Fail) => {
                        return Err(DomainError::MergeConflict {
                            document: document_name.to_string(),
                            key: key.unwrap_or_default(),
                            contracts: vec![merged[index].1.clone(), contract_id],
                        });
                    }
                    (Some(index), ConflictPolicy::LastWriterWins) => {
                        warn!(
                            document = document_name,
                            key = key.as_deref().unwrap_or_default(),
                            previous = %merged[index].1,
                            winner = %contract_id,
                            "Merge conflict resolved by last writer"
                        );
                        merged[index] = (key, contract_id.clone(), entry);
                    }
                }
            }
        }

        let mut root = Mapping::new();
        root.insert("version".into(), DOCUMENT_VERSION.into());
        root.insert(
            list_key.into(),
            Value::Sequence(merged.into_iter().map(|(_, _, entry)| entry).collect()),
        );
        Ok(root)
    }

    /// Merge and serialize.
    pub fn merge_to_string(
        kind: FragmentKind,
        documents: Vec<YamlDocument>,
        policy: ConflictPolicy,
        document_name: &str,
    ) -> Result<String, DomainError> {
        let merged = Self::merge(kind, documents, policy, document_name)?;
        serde_yaml::to_string(&merged).map_err(|e| DomainError::InvalidFragment {
            kind: kind.to_string(),
            contract: document_name.to_string(),
            reason: e.to_string(),
        })
    }
}
