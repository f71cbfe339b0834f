// dbt-contracts-core/src/domain/odps.rs
//
// Open Data Product Standard records: a product and its named ports.

use serde::{Deserialize, Serialize};

use crate::domain::odcs::version_text;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataProduct {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub input_ports: Vec<InputPort>,
    #[serde(default)]
    pub output_ports: Vec<OutputPort>,
}

impl DataProduct {
    pub fn is_empty(&self) -> bool {
        self.input_ports.is_empty() && self.output_ports.is_empty()
    }

    /// Input port name for a contract id, if any input port consumes it.
    pub fn input_port_for(&self, contract_id: &str) -> Option<&str> {
        self.input_ports
            .iter()
            .find(|p| p.contract_id == contract_id)
            .map(|p| p.name.as_str())
    }
}

/// Data the product consumes.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InputPort {
    pub name: String,
    #[serde(default, deserialize_with = "version_text")]
    pub version: Option<String>,
    pub contract_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Data the product produces, with its declared lineage.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutputPort {
    pub name: String,
    #[serde(default, deserialize_with = "version_text")]
    pub version: Option<String>,
    pub contract_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub port_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub input_contracts: Vec<InputContractRef>,
}

/// One lineage entry: `- contract-a` or `- {id: contract-a, version: 1.0.0}`.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(from = "LineageEntry")]
pub struct InputContractRef {
    pub id: String,
    pub version: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LineageEntry {
    Id(String),
    Full {
        id: String,
        #[serde(default, deserialize_with = "version_text")]
        version: Option<String>,
    },
}

impl From<LineageEntry> for InputContractRef {
    fn from(entry: LineageEntry) -> Self {
        match entry {
            LineageEntry::Id(id) => Self { id, version: None },
            LineageEntry::Full { id, version } => Self { id, version },
        }
    }
}
