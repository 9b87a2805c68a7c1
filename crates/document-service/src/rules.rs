//! Family business rules, checked after value-type validation
use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{Family, VariableValue};
use variable_engine::values::{parse_date, parse_number};
use variable_engine::ValueViolation;

lazy_static! {
    static ref SIRET_PATTERN: Regex = Regex::new(r"^[0-9]{14}$").unwrap();
}

/// Business-rule violations for a value snapshot of `family`
pub fn check_business_rules(family: Family, values: &[VariableValue]) -> Vec<ValueViolation> {
    match family {
        Family::Invoice => check_invoice(values),
        Family::Quote | Family::Contract => Vec::new(),
    }
}

fn value<'a>(values: &'a [VariableValue], name: &str) -> Option<&'a str> {
    values
        .iter()
        .find(|v| v.name == name)
        .map(|v| v.value.trim())
        .filter(|v| !v.is_empty())
}

fn rule(name: &str, message: &str) -> ValueViolation {
    ValueViolation::Rule {
        name: name.to_string(),
        message: message.to_string(),
    }
}

/// Invoice checks: due date after issue date, SIRET shape, positive amount
pub fn check_invoice(values: &[VariableValue]) -> Vec<ValueViolation> {
    let mut violations = Vec::new();

    let issue = value(values, "issue_date").and_then(parse_date);
    let due = value(values, "due_date").and_then(parse_date);
    if let (Some(issue), Some(due)) = (issue, due) {
        if due <= issue {
            violations.push(rule(
                "due_date",
                "due date must be after the issue date",
            ));
        }
    }

    if let Some(siret) = value(values, "freelancer_siret") {
        if !SIRET_PATTERN.is_match(siret) {
            violations.push(rule(
                "freelancer_siret",
                "SIRET must contain exactly 14 digits",
            ));
        }
    }

    if let Some(amount) = value(values, "total_amount").and_then(parse_number) {
        if amount <= 0.0 {
            violations.push(rule(
                "total_amount",
                "total amount must be strictly positive",
            ));
        }
    }

    violations
}
