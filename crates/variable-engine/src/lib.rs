//! Template variable engine
//!
//! Shared by quotes, invoices and contracts:
//! - placeholder extraction from HTML (`{{name}}` and editor chips)
//! - per-family system variable catalogs
//! - template variable schema validation
//! - value-type validation of submitted values
//! - placeholder substitution
//!
//! Everything here is pure and synchronous; no function performs I/O.

pub mod catalog;
pub mod errors;
pub mod extract;
pub mod render;
pub mod schema;
pub mod values;

pub use errors::{MissingVariable, SchemaError, UnknownType, ValueError, ValueViolation};
pub use extract::extract_variable_names;
pub use render::{render, substitute};
pub use values::is_well_formed;

use shared_types::{Family, SubmittedValue, VariableDefinition, VariableDraft, VariableValue};

/// Entry point bound to one document family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableEngine {
    family: Family,
}

impl VariableEngine {
    pub fn new(family: Family) -> Self {
        Self { family }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn system_variables(&self) -> Vec<VariableDefinition> {
        catalog::system_variables(self.family)
    }

    /// System variables followed by `custom`
    pub fn effective_variables(&self, custom: &[VariableDefinition]) -> Vec<VariableDefinition> {
        catalog::effective_variables(self.family, custom)
    }

    /// Validate a template's custom variables against its markup
    pub fn validate_template(
        &self,
        drafts: &[VariableDraft],
        content_html: &str,
    ) -> Result<Vec<VariableDefinition>, SchemaError> {
        schema::validate_template_variables(self.family, drafts, content_html)
    }

    /// Validate submitted values against a template's custom variables
    pub fn validate_values(
        &self,
        custom: &[VariableDefinition],
        submitted: &[SubmittedValue],
    ) -> Result<Vec<VariableValue>, ValueError> {
        values::validate_submission(&self.effective_variables(custom), submitted)
    }

    /// Render final document markup from a template and a value snapshot
    pub fn render(&self, template_html: &str, values: &[VariableValue]) -> String {
        render::render(template_html, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::VariableType;

    const QUOTE_HTML: &str = "<h1>Devis n°{{quote_number}}</h1>\
        <p>{{client_name}} / {{freelancer_name}}</p>\
        <p>{{quote_date}} → {{valid_until}}</p><p>{{total_amount}} € {{discount}}</p>";

    fn quote_values() -> Vec<SubmittedValue> {
        vec![
            SubmittedValue::new("client_name", "ACME"),
            SubmittedValue::new("freelancer_name", "Ada"),
            SubmittedValue::new("quote_date", "2025-03-01"),
            SubmittedValue::new("quote_number", "12"),
            SubmittedValue::new("total_amount", "1500"),
            SubmittedValue::new("valid_until", "2025-04-01"),
        ]
    }

    #[test]
    fn test_engine_template_to_document_flow() {
        let engine = VariableEngine::new(Family::Quote);
        let drafts = vec![VariableDraft::new("discount", "Remise", "number", false)];
        let custom = engine.validate_template(&drafts, QUOTE_HTML).unwrap();

        let mut submitted = quote_values();
        submitted.push(SubmittedValue::new("discount", "5"));
        let snapshot = engine.validate_values(&custom, &submitted).unwrap();
        assert_eq!(snapshot.len(), engine.system_variables().len() + 1);
        assert_eq!(snapshot.last().unwrap().kind, VariableType::Number);

        let html = engine.render(QUOTE_HTML, &snapshot);
        assert_eq!(
            html,
            "<h1>Devis n°12</h1><p>ACME / Ada</p><p>2025-03-01 → 2025-04-01</p><p>1500 € 5</p>"
        );
    }

    #[test]
    fn test_engine_rejects_missing_required_value() {
        let engine = VariableEngine::new(Family::Quote);
        let submitted: Vec<_> = quote_values()
            .into_iter()
            .filter(|v| v.name != "valid_until")
            .collect();
        let err = engine.validate_values(&[], &submitted).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].name(), "valid_until");
    }
}
