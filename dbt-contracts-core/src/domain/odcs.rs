// dbt-contracts-core/src/domain/odcs.rs
//
// Open Data Contract Standard (v3) records, reduced to what generation reads.
// Unknown keys are ignored so newer contract files still load.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

/// A data contract: schema, quality rules, servers and SLA for one data interface.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "version_text")]
    pub version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: Option<Description>,
    #[serde(default)]
    pub team: Option<Team>,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub sla_default_element: Option<String>,
    #[serde(default)]
    pub sla_properties: Vec<SlaProperty>,
    #[serde(rename = "schema", default)]
    pub schema: Vec<SchemaObject>,
}

impl Contract {
    pub fn id_or_unknown(&self) -> &str {
        self.id.as_deref().unwrap_or("<unknown>")
    }

    pub fn schema_object(&self, name: &str) -> Option<&SchemaObject> {
        self.schema.iter().find(|s| s.name.as_deref() == Some(name))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Description {
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub limitations: Option<String>,
    #[serde(default)]
    pub usage: Option<String>,
}

/// ODCS accepts either a team object or a bare list of members.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Team {
    Members(Vec<TeamMember>),
    Group {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        members: Vec<TeamMember>,
    },
}

impl Team {
    pub fn members(&self) -> &[TeamMember] {
        match self {
            Team::Members(members) => members,
            Team::Group { members, .. } => members,
        }
    }

    /// First member whose role is `owner`.
    pub fn owner(&self) -> Option<&str> {
        self.members()
            .iter()
            .find(|m| m.role.as_deref() == Some("owner"))
            .and_then(|m| m.name.as_deref().or(m.username.as_deref()))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct TeamMember {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Server {
    #[serde(default)]
    pub server: Option<String>,
    #[serde(rename = "type", default)]
    pub server_type: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    // BigQuery flavour
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub dataset: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SlaProperty {
    pub property: String,
    #[serde(default)]
    pub value: Option<serde_yaml::Value>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub element: Option<String>,
}

/// A table-like entity of the contract.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaObject {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub physical_name: Option<String>,
    #[serde(default)]
    pub physical_type: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub quality: Vec<QualityRule>,
}

/// A column-like entity of a schema object.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logical_type: Option<String>,
    #[serde(default)]
    pub physical_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub critical_data_element: Option<bool>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub quality: Vec<QualityRule>,
}

impl Property {
    pub fn is_not_null(&self) -> bool {
        self.required || self.primary_key
    }

    pub fn is_unique(&self) -> bool {
        self.unique || self.primary_key
    }
}

/// A declarative quality assertion, attached to a schema object or a property.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QualityRule {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub rule_type: Option<String>,
    // `rule` is the pre-3.0 spelling of `metric`
    #[serde(default, alias = "rule")]
    pub metric: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub implementation: Option<serde_yaml::Value>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub must_be: Option<f64>,
    #[serde(default)]
    pub must_be_greater_than: Option<f64>,
    #[serde(default)]
    pub must_be_greater_or_equal_to: Option<f64>,
    #[serde(default)]
    pub must_be_less_than: Option<f64>,
    #[serde(default)]
    pub must_be_less_or_equal_to: Option<f64>,
    #[serde(default)]
    pub must_be_between: Option<[f64; 2]>,
}

impl QualityRule {
    /// Human label used in logs and warnings.
    pub fn label(&self) -> String {
        self.description
            .clone()
            .or_else(|| self.name.clone())
            .or_else(|| self.id.clone())
            .or_else(|| self.metric.clone())
            .or_else(|| self.rule_type.clone())
            .unwrap_or_else(|| "<unnamed rule>".to_string())
    }
}

/// `version: 1` and `version: 1.0` arrive as YAML numbers; keep their text.
pub(crate) fn version_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a version string or number, found {other:?}"
        ))),
    }
}
