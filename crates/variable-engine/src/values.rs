//! Value-type validation and document value snapshots

use crate::errors::{ValueError, ValueViolation};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{SubmittedValue, VariableDefinition, VariableType, VariableValue};
use std::collections::HashMap;
use url::Url;

lazy_static! {
    /// Conservative `local@domain.tld` shape
    static ref EMAIL_PATTERN: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Whether a present value is well-formed for `kind`
///
/// Blank values are the caller's concern: see [`check_value`].
pub fn is_well_formed(value: &str, kind: VariableType) -> bool {
    match kind {
        VariableType::String | VariableType::Textarea => true,
        VariableType::Number => parse_number(value).is_some(),
        VariableType::Date => parse_date(value).is_some(),
        VariableType::Email => EMAIL_PATTERN.is_match(value),
        VariableType::Url => is_absolute_url(value),
        VariableType::Boolean => matches!(value, "true" | "false"),
    }
}

/// Finite number parsed from the whole (trimmed) value
pub fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Calendar date of an ISO-8601 date or date-time value
///
/// Accepts `YYYY-MM-DD`, RFC 3339 date-times and local `YYYY-MM-DDTHH:MM[:SS]`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|datetime| datetime.date())
}

fn is_absolute_url(value: &str) -> bool {
    Url::parse(value).map(|url| url.has_host()).unwrap_or(false)
}

/// Check one value against its definition
///
/// A blank value passes unless the variable is required and not deferred.
pub fn check_value(def: &VariableDefinition, value: &str) -> Result<(), ValueViolation> {
    if value.trim().is_empty() {
        if def.required && !def.deferred {
            return Err(ValueViolation::Missing {
                name: def.name.clone(),
                label: def.label.clone(),
            });
        }
        return Ok(());
    }

    if is_well_formed(value, def.kind) {
        Ok(())
    } else {
        Err(ValueViolation::InvalidType {
            name: def.name.clone(),
            label: def.label.clone(),
            expected: def.kind,
            value: value.to_string(),
        })
    }
}

/// Validate a document submission and snapshot it
///
/// `definitions` is the template's effective variable set. The snapshot holds
/// one entry per definition, in definition order; variables not submitted get
/// an empty value. Every violation is collected before failing.
pub fn validate_submission(
    definitions: &[VariableDefinition],
    submitted: &[SubmittedValue],
) -> Result<Vec<VariableValue>, ValueError> {
    let mut violations = Vec::new();

    let mut by_name: HashMap<&str, &str> = HashMap::new();
    for entry in submitted {
        if definitions.iter().any(|d| d.name == entry.name) {
            by_name.insert(entry.name.as_str(), entry.value.as_str());
        } else {
            violations.push(ValueViolation::UnknownVariable {
                name: entry.name.clone(),
            });
        }
    }

    let mut snapshot = Vec::with_capacity(definitions.len());
    for def in definitions {
        let value = by_name.get(def.name.as_str()).copied().unwrap_or("");
        if let Err(violation) = check_value(def, value) {
            violations.push(violation);
        }
        snapshot.push(VariableValue::from_definition(def, value));
    }

    ValueError::check(violations)?;
    tracing::debug!(values = snapshot.len(), "validated variable values");
    Ok(snapshot)
}

/// Re-check a frozen snapshot against its own definitions
pub fn validate_snapshot(values: &[VariableValue]) -> Result<(), ValueError> {
    let violations = values
        .iter()
        .filter_map(|v| check_value(&v.definition(), &v.value).err())
        .collect();
    ValueError::check(violations)
}

/// Apply `updates` to a snapshot by variable name, then re-validate it
///
/// Names outside the snapshot are rejected; definitions are never taken from
/// the current template, so later template edits cannot leak in.
pub fn merge_values(
    snapshot: &[VariableValue],
    updates: &[SubmittedValue],
) -> Result<Vec<VariableValue>, ValueError> {
    let mut merged = snapshot.to_vec();
    let mut violations = Vec::new();

    for update in updates {
        match merged.iter_mut().find(|v| v.name == update.name) {
            Some(slot) => slot.value = update.value.clone(),
            None => violations.push(ValueViolation::UnknownVariable {
                name: update.name.clone(),
            }),
        }
    }

    ValueError::check(violations)?;
    validate_snapshot(&merged)?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn def(name: &str, kind: VariableType, required: bool) -> VariableDefinition {
        VariableDefinition::custom(name, name, kind, required)
    }

    #[test]
    fn test_number_predicate() {
        assert!(is_well_formed("42", VariableType::Number));
        assert!(is_well_formed("-3.5", VariableType::Number));
        assert!(is_well_formed(" 1e3 ", VariableType::Number));
        assert!(!is_well_formed("abc", VariableType::Number));
        assert!(!is_well_formed("12abc", VariableType::Number));
        assert!(!is_well_formed("NaN", VariableType::Number));
        assert!(!is_well_formed("inf", VariableType::Number));
        assert!(!is_well_formed("1,5", VariableType::Number));
    }

    #[test]
    fn test_date_predicate() {
        assert!(is_well_formed("2025-02-28", VariableType::Date));
        assert!(is_well_formed("2024-02-29", VariableType::Date));
        assert!(is_well_formed("2025-02-28T10:30:00Z", VariableType::Date));
        assert!(is_well_formed("2025-02-28T10:30", VariableType::Date));
        assert!(!is_well_formed("2025-02-30", VariableType::Date));
        assert!(!is_well_formed("2025-13-01", VariableType::Date));
        assert!(!is_well_formed("tomorrow", VariableType::Date));
        assert_eq!(
            parse_date("2025-02-28T23:30:00+02:00"),
            NaiveDate::from_ymd_opt(2025, 2, 28)
        );
    }

    #[test]
    fn test_email_predicate() {
        assert!(is_well_formed("jane@example.fr", VariableType::Email));
        assert!(!is_well_formed("jane@example", VariableType::Email));
        assert!(!is_well_formed("jane doe@example.fr", VariableType::Email));
        assert!(!is_well_formed("@example.fr", VariableType::Email));
    }

    #[test]
    fn test_url_predicate() {
        assert!(is_well_formed("https://x.io/a", VariableType::Url));
        assert!(is_well_formed("http://localhost:8080", VariableType::Url));
        assert!(!is_well_formed("not-a-url", VariableType::Url));
        assert!(!is_well_formed("/relative/path", VariableType::Url));
        assert!(!is_well_formed("mailto:jane@example.fr", VariableType::Url));
    }

    #[test]
    fn test_boolean_predicate() {
        assert!(is_well_formed("true", VariableType::Boolean));
        assert!(is_well_formed("false", VariableType::Boolean));
        assert!(!is_well_formed("yes", VariableType::Boolean));
        assert!(!is_well_formed("TRUE", VariableType::Boolean));
    }

    #[test]
    fn test_text_types_accept_anything() {
        assert!(is_well_formed("{{ whatever }}", VariableType::String));
        assert!(is_well_formed("multi\nline", VariableType::Textarea));
    }

    #[test]
    fn test_empty_string_depends_on_required() {
        assert!(check_value(&def("note", VariableType::String, false), "").is_ok());
        assert_eq!(
            check_value(&def("note", VariableType::String, true), ""),
            Err(ValueViolation::Missing {
                name: "note".to_string(),
                label: "note".to_string()
            })
        );
        assert!(check_value(&def("note", VariableType::String, true), "   ").is_err());
    }

    #[test]
    fn test_deferred_may_be_blank_but_not_malformed() {
        let signed = def("client_date_signed", VariableType::Date, true).deferred();
        assert!(check_value(&signed, "").is_ok());
        assert!(check_value(&signed, "2025-06-01").is_ok());
        assert!(matches!(
            check_value(&signed, "soon"),
            Err(ValueViolation::InvalidType { .. })
        ));
    }

    #[test]
    fn test_submission_collects_all_violations() {
        let defs = vec![
            def("amount", VariableType::Number, true),
            def("email", VariableType::Email, false),
            def("title", VariableType::String, true),
        ];
        let submitted = vec![
            SubmittedValue::new("amount", "abc"),
            SubmittedValue::new("email", "nope"),
            SubmittedValue::new("ghost", "boo"),
        ];
        let err = validate_submission(&defs, &submitted).unwrap_err();
        let names: Vec<_> = err.violations.iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["ghost", "amount", "email", "title"]);
    }

    #[test]
    fn test_submission_snapshots_every_definition() {
        let defs = vec![
            def("amount", VariableType::Number, true),
            def("note", VariableType::Textarea, false),
        ];
        let snapshot =
            validate_submission(&defs, &[SubmittedValue::new("amount", "1200")]).unwrap();
        assert_eq!(
            snapshot,
            vec![
                VariableValue::from_definition(&defs[0], "1200"),
                VariableValue::from_definition(&defs[1], ""),
            ]
        );
    }

    #[test]
    fn test_merge_updates_snapshot_values() {
        let defs = vec![
            def("amount", VariableType::Number, true),
            def("note", VariableType::Textarea, false),
        ];
        let snapshot =
            validate_submission(&defs, &[SubmittedValue::new("amount", "10")]).unwrap();

        let merged = merge_values(&snapshot, &[SubmittedValue::new("note", "merci")]).unwrap();
        assert_eq!(merged[0].value, "10");
        assert_eq!(merged[1].value, "merci");

        let err = merge_values(&snapshot, &[SubmittedValue::new("amount", "")]).unwrap_err();
        assert!(matches!(err.violations[0], ValueViolation::Missing { .. }));

        let err = merge_values(&snapshot, &[SubmittedValue::new("other", "x")]).unwrap_err();
        assert!(matches!(
            err.violations[0],
            ValueViolation::UnknownVariable { .. }
        ));
    }
}
