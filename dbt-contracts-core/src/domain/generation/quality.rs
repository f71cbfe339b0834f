// dbt-contracts-core/src/domain/generation/quality.rs
//
// ODCS quality rules -> dbt data tests.

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::domain::generation::fragment::{YamlDocument, child_mapping, child_sequence, find_named_mut};
use crate::domain::generation::warning::GenerationWarning;
use crate::domain::odcs::{Contract, QualityRule};

const EXPRESSION_TEST: &str = "dbt_utils.expression_is_true";
const ROW_COUNT_TEST: &str = "dbt_expectations.expect_table_row_count_to_be_between";
const NOT_NULL_TEST: &str = "dbt_expectations.expect_column_values_to_not_be_null";
const UNIQUE_TEST: &str = "dbt_expectations.expect_column_values_to_be_unique";

/// Where a rule is declared: on a schema object or on one of its properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment<'a> {
    Table(&'a str),
    Column { model: &'a str, column: &'a str },
}

impl Attachment<'_> {
    fn describe(&self) -> String {
        match self {
            Attachment::Table(model) => format!("model '{model}'"),
            Attachment::Column { model, column } => format!("column '{model}.{column}'"),
        }
    }
}

/// The closed set of rule shapes with a dbt counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleShape {
    Expression,
    PassThrough,
    RowCount,
    NotNull,
    Unique,
}

impl RuleShape {
    pub fn of(rule: &QualityRule) -> Option<Self> {
        match rule.rule_type.as_deref() {
            Some("sql") => return Some(RuleShape::Expression),
            Some("custom") if rule.engine.as_deref() == Some("dbt") => {
                return Some(RuleShape::PassThrough);
            }
            _ => {}
        }
        match rule.metric.as_deref() {
            Some("rowCount") => Some(RuleShape::RowCount),
            Some("nullValues") => Some(RuleShape::NotNull),
            Some("duplicateValues") => Some(RuleShape::Unique),
            _ => None,
        }
    }
}

/// Result of converting one rule. A miss is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    Test(Value),
    Miss(String),
}

pub struct QualityRuleConverter;

impl QualityRuleConverter {
    pub fn convert(rule: &QualityRule, attachment: Attachment<'_>) -> Conversion {
        let Some(shape) = RuleShape::of(rule) else {
            return Conversion::Miss(format!(
                "unsupported rule (type={}, metric={})",
                rule.rule_type.as_deref().unwrap_or("-"),
                rule.metric.as_deref().unwrap_or("-"),
            ));
        };

        let entry = match shape {
            RuleShape::Expression => {
                let Some(query) = rule.query.as_deref() else {
                    return Conversion::Miss("sql rule without query".to_string());
                };
                let mut args = Mapping::new();
                args.insert("expression".into(), query.trim().into());
                if let Some(description) = &rule.description {
                    args.insert("name".into(), description.as_str().into());
                }
                single(EXPRESSION_TEST, args)
            }
            RuleShape::PassThrough => match &rule.implementation {
                Some(Value::Mapping(implementation)) => Value::Mapping(implementation.clone()),
                Some(Value::String(test_name)) => Value::String(test_name.clone()),
                Some(_) => {
                    return Conversion::Miss(
                        "custom dbt implementation is neither a mapping nor a test name"
                            .to_string(),
                    );
                }
                None => return Conversion::Miss("custom dbt rule without implementation".to_string()),
            },
            RuleShape::RowCount => single(ROW_COUNT_TEST, row_count_bounds(rule)),
            RuleShape::NotNull | RuleShape::Unique => {
                if let Attachment::Table(_) = attachment {
                    return Conversion::Miss("column metric declared at table level".to_string());
                }
                let mut args = Mapping::new();
                let test = if shape == RuleShape::NotNull {
                    if let Some(tolerance) = rule.must_be_less_or_equal_to.filter(|p| *p > 0.0) {
                        args.insert("mostly".into(), number(1.0 - tolerance));
                    }
                    NOT_NULL_TEST
                } else {
                    UNIQUE_TEST
                };
                single(test, args)
            }
        };

        Conversion::Test(match rule.severity.as_deref() {
            Some(severity) => with_severity(entry, severity),
            None => entry,
        })
    }

    /// Append converted table and column tests to every model of `doc` that
    /// matches a schema object of `contract`. Existing tests are kept.
    pub fn inject(
        doc: &mut YamlDocument,
        contract: &Contract,
        warnings: &mut Vec<GenerationWarning>,
    ) {
        let contract_id = contract.id_or_unknown();
        let Some(models) = doc.entries_mut() else {
            return;
        };

        for object in &contract.schema {
            let Some(model_name) = object.name.as_deref() else {
                continue;
            };
            let Some(model) = find_named_mut(models, model_name) else {
                continue;
            };

            // 1. Table-level rules
            let tests = convert_all(
                &object.quality,
                Attachment::Table(model_name),
                contract_id,
                warnings,
            );
            if !tests.is_empty() {
                child_sequence(model, "data_tests").extend(tests);
            }

            // 2. Column-level rules
            for property in &object.properties {
                let Some(column_name) = property.name.as_deref() else {
                    continue;
                };
                if property.quality.is_empty() {
                    continue;
                }
                let Some(column) = model
                    .get_mut("columns")
                    .and_then(Value::as_sequence_mut)
                    .and_then(|columns| find_named_mut(columns, column_name))
                else {
                    continue;
                };

                let tests = convert_all(
                    &property.quality,
                    Attachment::Column {
                        model: model_name,
                        column: column_name,
                    },
                    contract_id,
                    warnings,
                );
                if !tests.is_empty() {
                    child_sequence(column, "data_tests").extend(tests);
                }
            }
        }
    }
}

fn convert_all(
    rules: &[QualityRule],
    attachment: Attachment<'_>,
    contract_id: &str,
    warnings: &mut Vec<GenerationWarning>,
) -> Vec<Value> {
    let mut tests = Vec::new();
    for rule in rules {
        match QualityRuleConverter::convert(rule, attachment) {
            Conversion::Test(test) => tests.push(test),
            Conversion::Miss(reason) => {
                debug!(
                    contract = contract_id,
                    target = %attachment.describe(),
                    rule = %rule.label(),
                    %reason,
                    "Skipping quality rule"
                );
                warnings.push(GenerationWarning::QualityRuleSkipped {
                    contract: contract_id.to_string(),
                    target: attachment.describe(),
                    rule: rule.label(),
                    reason,
                });
            }
        }
    }
    tests
}

fn row_count_bounds(rule: &QualityRule) -> Mapping {
    let mut min = None;
    let mut max = None;
    if let Some(n) = rule.must_be_greater_than {
        min = Some(n + 1.0);
    }
    if let Some(n) = rule.must_be_greater_or_equal_to {
        min = Some(n);
    }
    if let Some(n) = rule.must_be_less_than {
        max = Some(n - 1.0);
    }
    if let Some(n) = rule.must_be_less_or_equal_to {
        max = Some(n);
    }
    if let Some([low, high]) = rule.must_be_between {
        min = Some(low);
        max = Some(high);
    }

    let mut args = Mapping::new();
    if let Some(min) = min {
        args.insert("min_value".into(), number(min));
    }
    if let Some(max) = max {
        args.insert("max_value".into(), number(max));
    }
    args
}

fn single(test: &str, args: Mapping) -> Value {
    let mut entry = Mapping::new();
    entry.insert(test.into(), Value::Mapping(args));
    Value::Mapping(entry)
}

/// Put `config.severity` inside the test arguments, where dbt reads it.
fn with_severity(entry: Value, severity: &str) -> Value {
    // ODCS spells it `warning`, dbt `warn`; anything else is kept as given
    let severity = if severity.eq_ignore_ascii_case("warning") {
        "warn"
    } else {
        severity
    };

    match entry {
        Value::String(test_name) => {
            let mut args = Mapping::new();
            child_mapping(&mut args, "config").insert("severity".into(), severity.into());
            single(&test_name, args)
        }
        Value::Mapping(mut map) => {
            if map.len() == 1
                && let Some((_, Value::Mapping(args))) = map.iter_mut().next()
            {
                child_mapping(args, "config").insert("severity".into(), severity.into());
            } else {
                child_mapping(&mut map, "config").insert("severity".into(), severity.into());
            }
            Value::Mapping(map)
        }
        other => other,
    }
}

/// Whole numbers stay integers in the emitted YAML.
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::generation::fragment::{Fragment, FragmentKind};

    fn rule(yaml: &str) -> QualityRule {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn yaml(value: &Value) -> String {
        serde_yaml::to_string(value).unwrap()
    }

    const COLUMN: Attachment<'static> = Attachment::Column {
        model: "payments",
        column: "amount",
    };

    #[test]
    fn test_expression_rule() {
        let converted = QualityRuleConverter::convert(
            &rule("type: sql\nquery: amount >= 0\ndescription: positive amounts\nseverity: error\n"),
            Attachment::Table("payments"),
        );
        let Conversion::Test(test) = converted else {
            panic!("expected a test");
        };
        assert_eq!(
            yaml(&test),
            "dbt_utils.expression_is_true:\n  expression: amount >= 0\n  name: positive amounts\n  config:\n    severity: error\n"
        );
    }

    #[test]
    fn test_expression_rule_without_query_is_a_miss() {
        let converted =
            QualityRuleConverter::convert(&rule("type: sql\n"), Attachment::Table("payments"));
        assert!(matches!(converted, Conversion::Miss(_)));
    }

    #[test]
    fn test_pass_through_rule() {
        let object = rule(
            "type: custom\nengine: dbt\nimplementation:\n  dbt_utils.accepted_range:\n    min_value: 0\nseverity: warning\n",
        );
        let Conversion::Test(test) = QualityRuleConverter::convert(&object, COLUMN) else {
            panic!("expected a test");
        };
        assert_eq!(
            yaml(&test),
            "dbt_utils.accepted_range:\n  min_value: 0\n  config:\n    severity: warn\n"
        );

        let bare = rule("type: custom\nengine: dbt\nimplementation: not_empty_string\n");
        assert_eq!(
            QualityRuleConverter::convert(&bare, COLUMN),
            Conversion::Test(Value::from("not_empty_string"))
        );
    }

    #[test]
    fn test_custom_rule_for_other_engine_is_a_miss() {
        let other = rule("type: custom\nengine: soda\nimplementation: x\n");
        assert!(matches!(
            QualityRuleConverter::convert(&other, COLUMN),
            Conversion::Miss(_)
        ));
    }

    #[test]
    fn test_row_count_bounds() {
        let exclusive = rule("metric: rowCount\nmustBeGreaterThan: 10\nmustBeLessThan: 100\n");
        let Conversion::Test(test) =
            QualityRuleConverter::convert(&exclusive, Attachment::Table("payments"))
        else {
            panic!("expected a test");
        };
        assert_eq!(
            yaml(&test),
            "dbt_expectations.expect_table_row_count_to_be_between:\n  min_value: 11\n  max_value: 99\n"
        );

        let between = rule("metric: rowCount\nmustBeBetween: [1, 5]\n");
        let Conversion::Test(test) =
            QualityRuleConverter::convert(&between, Attachment::Table("payments"))
        else {
            panic!("expected a test");
        };
        assert_eq!(
            yaml(&test),
            "dbt_expectations.expect_table_row_count_to_be_between:\n  min_value: 1\n  max_value: 5\n"
        );
    }

    #[test]
    fn test_null_values_with_tolerance() {
        let strict = rule("metric: nullValues\nmustBe: 0\n");
        assert_eq!(
            QualityRuleConverter::convert(&strict, COLUMN),
            Conversion::Test(single(NOT_NULL_TEST, Mapping::new()))
        );

        let tolerant = rule("metric: nullValues\nmustBeLessOrEqualTo: 0.25\n");
        let Conversion::Test(test) = QualityRuleConverter::convert(&tolerant, COLUMN) else {
            panic!("expected a test");
        };
        assert_eq!(
            yaml(&test),
            "dbt_expectations.expect_column_values_to_not_be_null:\n  mostly: 0.75\n"
        );
    }

    #[test]
    fn test_severity_kept_as_given() {
        for given in ["error", "Error", "warn", "fatal"] {
            let converted = QualityRuleConverter::convert(
                &rule(&format!("metric: duplicateValues\nseverity: {given}\n")),
                COLUMN,
            );
            let Conversion::Test(test) = converted else {
                panic!("expected a test");
            };
            assert_eq!(
                test[UNIQUE_TEST]["config"]["severity"].as_str(),
                Some(given),
                "{given}"
            );
        }
    }

    #[test]
    fn test_duplicate_values() {
        let converted =
            QualityRuleConverter::convert(&rule("metric: duplicateValues\n"), COLUMN);
        assert_eq!(converted, Conversion::Test(single(UNIQUE_TEST, Mapping::new())));
    }

    #[test]
    fn test_column_metric_at_table_level_is_a_miss() {
        let converted = QualityRuleConverter::convert(
            &rule("metric: duplicateValues\n"),
            Attachment::Table("payments"),
        );
        assert!(matches!(converted, Conversion::Miss(_)));
    }

    #[test]
    fn test_unknown_shape_is_a_miss() {
        let converted = QualityRuleConverter::convert(
            &rule("type: text\ndescription: must be nice\n"),
            COLUMN,
        );
        assert!(matches!(converted, Conversion::Miss(_)));
    }

    #[test]
    fn test_inject_appends_without_removing() {
        let contract: Contract = serde_yaml::from_str(
            r#"
id: c1
schema:
  - name: payments
    quality:
      - metric: rowCount
        mustBeGreaterOrEqualTo: 1
      - type: text
    properties:
      - name: amount
        quality:
          - metric: nullValues
            severity: error
      - name: ghost
        quality:
          - metric: duplicateValues
"#,
        )
        .unwrap();
        let mut doc = Fragment::document(
            FragmentKind::ModelDefinition,
            "c1",
            "version: 2\nmodels:\n  - name: payments\n    columns:\n      - name: amount\n        data_tests:\n          - not_null\n",
        )
        .parse()
        .unwrap();

        let mut warnings = Vec::new();
        QualityRuleConverter::inject(&mut doc, &contract, &mut warnings);

        let model = &doc.entries()[0];
        assert_eq!(model["data_tests"].as_sequence().unwrap().len(), 1);
        let column_tests = model["columns"][0]["data_tests"].as_sequence().unwrap();
        assert_eq!(column_tests.len(), 2);
        assert_eq!(column_tests[0], Value::from("not_null"));
        assert!(column_tests[1].get(NOT_NULL_TEST).is_some());

        // the `type: text` rule is reported, the ghost column is silently absent
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            GenerationWarning::QualityRuleSkipped { target, .. } if target == "model 'payments'"
        ));
    }
}
