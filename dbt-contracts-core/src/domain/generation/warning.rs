// dbt-contracts-core/src/domain/generation/warning.rs

use serde::Serialize;
use std::fmt;

/// Non-fatal conditions collected during a run and returned next to the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationWarning {
    /// A `source()`/`ref()` target not covered by the port's declared lineage.
    UnresolvedReference {
        port: String,
        model: String,
        reference: String,
    },
    /// A quality rule that maps to no test.
    QualityRuleSkipped {
        contract: String,
        target: String,
        rule: String,
        reason: String,
    },
    /// An SLA property whose value could not become a freshness threshold.
    InvalidSla {
        contract: String,
        property: String,
        value: String,
    },
    UnnamedSchemaObject {
        contract: String,
    },
}

impl fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationWarning::UnresolvedReference {
                port,
                model,
                reference,
            } => write!(
                f,
                "port '{port}', model '{model}': reference '{reference}' is not declared in inputContracts"
            ),
            GenerationWarning::QualityRuleSkipped {
                contract,
                target,
                rule,
                reason,
            } => write!(
                f,
                "contract '{contract}', {target}: quality rule '{rule}' skipped ({reason})"
            ),
            GenerationWarning::InvalidSla {
                contract,
                property,
                value,
            } => write!(
                f,
                "contract '{contract}': SLA property '{property}' has non-integer value '{value}'"
            ),
            GenerationWarning::UnnamedSchemaObject { contract } => {
                write!(f, "contract '{contract}': schema object without a name")
            }
        }
    }
}
