//! Template variable schema validation
//!
//! Checks a template's declared custom variables against the family's system
//! catalog and against the markup, in this order:
//! 1. name collisions (duplicates among custom variables, then system names)
//! 2. definition validity (identifier grammar, then known types)
//! 3. required-variable coverage of the markup (system and custom)
//!
//! Each rule reports every offending variable of its kind at once. Template
//! name uniqueness needs storage and is checked by the template service.

use crate::catalog;
use crate::errors::{MissingVariable, SchemaError, UnknownType};
use crate::extract;
use shared_types::{is_identifier, Family, VariableDefinition, VariableDraft, VariableType};
use std::collections::{HashMap, HashSet};

/// Validate `drafts` for a template of `family` whose markup is `content_html`
///
/// Returns the normalized custom definitions (trimmed names and labels, an
/// empty label replaced by the name, parsed types) on success.
pub fn validate_template_variables(
    family: Family,
    drafts: &[VariableDraft],
    content_html: &str,
) -> Result<Vec<VariableDefinition>, SchemaError> {
    check_name_collisions(family, drafts)?;
    let custom = check_definitions(drafts)?;

    let mut required = catalog::system_variables(family);
    required.extend(custom.iter().cloned());
    let missing = missing_required(&required, content_html);
    if !missing.is_empty() {
        tracing::debug!(
            family = %family,
            missing = missing.len(),
            "template markup lacks required variables"
        );
        return Err(SchemaError::MissingRequired { missing });
    }

    Ok(custom)
}

/// Rule 1: no duplicate custom names, no custom name shadowing the catalog
pub fn check_name_collisions(family: Family, drafts: &[VariableDraft]) -> Result<(), SchemaError> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    for draft in drafts {
        let name = draft.name.trim();
        let count = counts.entry(name).or_insert(0);
        if *count == 0 {
            order.push(name);
        }
        *count += 1;
    }

    let duplicates: Vec<String> = order
        .iter()
        .filter(|name| counts[*name] > 1)
        .map(|name| name.to_string())
        .collect();
    if !duplicates.is_empty() {
        return Err(SchemaError::DuplicateVariables { names: duplicates });
    }

    let reserved: Vec<String> = order
        .iter()
        .filter(|name| catalog::is_system_variable(family, name))
        .map(|name| name.to_string())
        .collect();
    if !reserved.is_empty() {
        return Err(SchemaError::ReservedVariables {
            family,
            names: reserved,
        });
    }

    Ok(())
}

/// Rule 2: identifier grammar and known types; builds the definitions
pub fn check_definitions(drafts: &[VariableDraft]) -> Result<Vec<VariableDefinition>, SchemaError> {
    let invalid: Vec<String> = drafts
        .iter()
        .map(|d| d.name.trim())
        .filter(|name| !is_identifier(name))
        .map(str::to_string)
        .collect();
    if !invalid.is_empty() {
        return Err(SchemaError::InvalidNames { names: invalid });
    }

    let mut definitions = Vec::with_capacity(drafts.len());
    let mut unknown = Vec::new();
    for draft in drafts {
        let name = draft.name.trim();
        match draft.kind.trim().parse::<VariableType>() {
            Ok(kind) => {
                let label = match draft.label.trim() {
                    "" => name,
                    label => label,
                };
                definitions.push(VariableDefinition::custom(name, label, kind, draft.required));
            }
            Err(_) => unknown.push(UnknownType {
                name: name.to_string(),
                found: draft.kind.clone(),
            }),
        }
    }

    if !unknown.is_empty() {
        return Err(SchemaError::UnknownTypes {
            variables: unknown,
            allowed: VariableType::allowed()
                .into_iter()
                .map(str::to_string)
                .collect(),
        });
    }

    Ok(definitions)
}

/// Rule 3: every required definition absent from `content_html`
///
/// Deferred variables count as required here: their placeholders must exist
/// for the later signing step to fill them.
pub fn missing_required(
    definitions: &[VariableDefinition],
    content_html: &str,
) -> Vec<MissingVariable> {
    let referenced = extract::referenced_variables(content_html);
    let mut reported = HashSet::new();

    definitions
        .iter()
        .filter(|def| def.required && !referenced.contains(&def.name))
        .filter(|def| reported.insert(def.name.clone()))
        .map(|def| MissingVariable {
            name: def.name.clone(),
            label: def.label.clone(),
        })
        .collect()
}
