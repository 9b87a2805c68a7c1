//! Error types for schema and value validation

use serde::Serialize;
use shared_types::{Family, VariableType};
use std::fmt;
use thiserror::Error;

/// A required variable absent from template markup or from a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingVariable {
    pub name: String,
    pub label: String,
}

impl fmt::Display for MissingVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.label)
    }
}

/// A custom variable declared with a type outside `VariableType`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownType {
    pub name: String,
    pub found: String,
}

/// Template-level schema violations, reported in rule order
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaError {
    #[error("Variables defined more than once: {}", .names.join(", "))]
    DuplicateVariables { names: Vec<String> },

    #[error("Variables reserved by the {family} system catalog: {}", .names.join(", "))]
    ReservedVariables { family: Family, names: Vec<String> },

    #[error("Invalid variable names (expected [A-Za-z_][A-Za-z0-9_]*): {}", .names.join(", "))]
    InvalidNames { names: Vec<String> },

    #[error("{}", describe_unknown_types(.variables, .allowed))]
    UnknownTypes {
        variables: Vec<UnknownType>,
        allowed: Vec<String>,
    },

    #[error("Template content is missing required variables: {}", join_display(.missing))]
    MissingRequired { missing: Vec<MissingVariable> },
}

impl SchemaError {
    /// Names of the offending variables, whatever the rule
    pub fn offending_names(&self) -> Vec<&str> {
        match self {
            SchemaError::DuplicateVariables { names }
            | SchemaError::ReservedVariables { names, .. }
            | SchemaError::InvalidNames { names } => names.iter().map(String::as_str).collect(),
            SchemaError::UnknownTypes { variables, .. } => {
                variables.iter().map(|v| v.name.as_str()).collect()
            }
            SchemaError::MissingRequired { missing } => {
                missing.iter().map(|m| m.name.as_str()).collect()
            }
        }
    }
}

/// One per-variable problem found in submitted values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueViolation {
    /// Required value absent or blank
    Missing { name: String, label: String },
    /// Value not well-formed for the declared type
    InvalidType {
        name: String,
        label: String,
        expected: VariableType,
        value: String,
    },
    /// Value submitted for a variable the template does not define
    UnknownVariable { name: String },
    /// Family business rule (dates order, SIRET format, ...)
    Rule { name: String, message: String },
}

impl ValueViolation {
    pub fn name(&self) -> &str {
        match self {
            ValueViolation::Missing { name, .. }
            | ValueViolation::InvalidType { name, .. }
            | ValueViolation::UnknownVariable { name }
            | ValueViolation::Rule { name, .. } => name,
        }
    }
}

impl fmt::Display for ValueViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueViolation::Missing { name, label } => {
                write!(f, "required variable \"{}\" ({}) is missing or empty", name, label)
            }
            ValueViolation::InvalidType {
                name, expected, ..
            } => write!(f, "variable \"{}\" is not a valid {}", name, expected),
            ValueViolation::UnknownVariable { name } => {
                write!(f, "variable \"{}\" is not defined by the template", name)
            }
            ValueViolation::Rule { name, message } => write!(f, "{}: {}", name, message),
        }
    }
}

/// All value violations of one submission
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Invalid variable values: {}", join_display(.violations))]
pub struct ValueError {
    pub violations: Vec<ValueViolation>,
}

impl ValueError {
    pub fn new(violations: Vec<ValueViolation>) -> Self {
        Self { violations }
    }

    /// `Ok(())` when there is nothing to report
    pub fn check(violations: Vec<ValueViolation>) -> Result<(), ValueError> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self::new(violations))
        }
    }
}

fn join_display<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_unknown_types(variables: &[UnknownType], allowed: &[String]) -> String {
    let found = variables
        .iter()
        .map(|v| format!("\"{}\" has type \"{}\"", v.name, v.found))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Unknown variable types: {} (allowed: {})",
        found,
        allowed.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_lists_every_variable() {
        let err = SchemaError::MissingRequired {
            missing: vec![
                MissingVariable {
                    name: "valid_until".to_string(),
                    label: "Date de validité".to_string(),
                },
                MissingVariable {
                    name: "quote_date".to_string(),
                    label: "Date du devis".to_string(),
                },
            ],
        };
        let message = err.to_string();
        assert!(message.contains("valid_until (Date de validité)"));
        assert!(message.contains("quote_date (Date du devis)"));
        assert_eq!(err.offending_names(), vec!["valid_until", "quote_date"]);
    }

    #[test]
    fn test_unknown_types_message_lists_allowed_types() {
        let err = SchemaError::UnknownTypes {
            variables: vec![UnknownType {
                name: "amount".to_string(),
                found: "money".to_string(),
            }],
            allowed: VariableType::allowed().iter().map(|s| s.to_string()).collect(),
        };
        let message = err.to_string();
        assert!(message.contains("\"amount\" has type \"money\""));
        assert!(message.contains("string, number, date"));
    }

    #[test]
    fn test_schema_error_serializes_with_kind_tag() {
        let err = SchemaError::DuplicateVariables {
            names: vec!["amount".to_string()],
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "duplicate_variables");
        assert_eq!(json["names"][0], "amount");
    }

    #[test]
    fn test_value_error_check() {
        assert!(ValueError::check(vec![]).is_ok());
        let err = ValueError::check(vec![ValueViolation::UnknownVariable {
            name: "ghost".to_string(),
        }])
        .unwrap_err();
        assert_eq!(err.violations[0].name(), "ghost");
        assert!(err.to_string().contains("\"ghost\" is not defined"));
    }
}
