//! Template lifecycle
//!
//! Create, read, update, delete, duplicate and search templates of one
//! family. Every write runs the variable schema validation first and then the
//! template-level name check against storage.

use crate::defaults;
use crate::error::{Result, ServiceError};
use crate::store::{same_name, TemplateStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared_types::{Family, Template, VariableDefinition, VariableDraft};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use variable_engine::{catalog, schema};

/// Minimum trimmed query length for [`TemplateService::search`] to filter
pub const MIN_SEARCH_LEN: usize = 2;

/// A template as submitted by the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDraft {
    pub name: String,
    #[serde(alias = "contentHtml")]
    pub content_html: String,
    #[serde(default)]
    pub variables: Vec<VariableDraft>,
}

/// A stored template with its effective variable set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateView {
    #[serde(flatten)]
    pub template: Template,
    /// System variables first, then the template's custom ones
    pub effective_variables: Vec<VariableDefinition>,
}

impl From<Template> for TemplateView {
    fn from(template: Template) -> Self {
        let effective_variables =
            catalog::effective_variables(template.family, &template.variables);
        Self {
            template,
            effective_variables,
        }
    }
}

#[derive(Clone)]
pub struct TemplateService {
    store: Arc<dyn TemplateStore>,
}

impl TemplateService {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }

    /// Insert each family's built-in default template when missing
    ///
    /// Returns the number of templates inserted.
    pub fn seed_defaults(&self) -> Result<usize> {
        let mut inserted = 0;
        for family in Family::ALL {
            if self.store.default_template(family)?.is_none() {
                let template = defaults::default_template(family);
                info!(family = %family, name = %template.name, "seeding default template");
                self.store.insert_template(template)?;
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Full validation of `draft` without storing anything
    ///
    /// Schema rules first, then the name check; `exclude_id` is the template
    /// being updated, if any.
    pub fn validate(
        &self,
        family: Family,
        owner: &str,
        draft: &TemplateDraft,
        exclude_id: Option<&str>,
    ) -> Result<Vec<VariableDefinition>> {
        let custom =
            schema::validate_template_variables(family, &draft.variables, &draft.content_html)?;
        self.check_name(family, owner, &draft.name, exclude_id)?;
        debug!(family = %family, custom = custom.len(), "template draft is valid");
        Ok(custom)
    }

    /// Template-level name rule: not empty, not reserved, not taken
    pub fn check_name(
        &self,
        family: Family,
        owner: &str,
        name: &str,
        exclude_id: Option<&str>,
    ) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::EmptyTemplateName);
        }
        if catalog::is_reserved_template_name(family, name) {
            return Err(ServiceError::ReservedTemplateName(name.to_string()));
        }
        if self
            .store
            .find_template_by_name(family, owner, name, exclude_id)?
            .is_some()
        {
            return Err(ServiceError::DuplicateTemplateName(name.to_string()));
        }
        Ok(())
    }

    pub fn create(&self, family: Family, owner: &str, draft: TemplateDraft) -> Result<TemplateView> {
        let variables = self.validate(family, owner, &draft, None)?;
        let now = Utc::now();
        let template = Template {
            id: Uuid::new_v4().to_string(),
            family,
            name: draft.name.trim().to_string(),
            content_html: draft.content_html,
            variables,
            owner_id: Some(owner.to_string()),
            created_at: now,
            updated_at: now,
        };

        self.store.insert_template(template.clone())?;
        info!(family = %family, id = %template.id, owner, "created template");
        Ok(template.into())
    }

    pub fn get(&self, family: Family, id: &str, owner: &str) -> Result<TemplateView> {
        self.find_visible(family, id, owner).map(TemplateView::from)
    }

    pub fn list(&self, family: Family, owner: &str) -> Result<Vec<TemplateView>> {
        Ok(self
            .store
            .list_templates(family, owner)?
            .into_iter()
            .map(TemplateView::from)
            .collect())
    }

    /// Replace name, markup and the whole custom variable list
    pub fn update(
        &self,
        family: Family,
        id: &str,
        owner: &str,
        draft: TemplateDraft,
    ) -> Result<TemplateView> {
        let existing = self.find_visible(family, id, owner)?;
        if existing.is_default() {
            return Err(ServiceError::ImmutableTemplate);
        }

        let variables = self.validate(family, owner, &draft, Some(id))?;
        let template = Template {
            name: draft.name.trim().to_string(),
            content_html: draft.content_html,
            variables,
            updated_at: Utc::now(),
            ..existing
        };

        self.store.replace_template(template.clone())?;
        info!(family = %family, id, owner, "updated template");
        Ok(template.into())
    }

    pub fn delete(&self, family: Family, id: &str, owner: &str) -> Result<()> {
        let existing = self.find_visible(family, id, owner)?;
        if existing.is_default() {
            return Err(ServiceError::ImmutableTemplate);
        }
        if !self.store.delete_template(family, id)? {
            return Err(ServiceError::template_not_found(family, id));
        }
        info!(family = %family, id, owner, "deleted template");
        Ok(())
    }

    /// Copy a visible template, default included, into `owner`'s space
    pub fn duplicate(&self, family: Family, id: &str, owner: &str) -> Result<TemplateView> {
        let source = self.find_visible(family, id, owner)?;
        let existing: Vec<String> = self
            .store
            .list_templates(family, owner)?
            .into_iter()
            .map(|t| t.name)
            .collect();
        let name = copy_name(&source.name, &existing);

        let now = Utc::now();
        let copy = Template {
            id: Uuid::new_v4().to_string(),
            name,
            owner_id: Some(owner.to_string()),
            created_at: now,
            updated_at: now,
            ..source
        };

        self.store.insert_template(copy.clone())?;
        info!(family = %family, source = id, id = %copy.id, name = %copy.name, "duplicated template");
        Ok(copy.into())
    }

    /// Visible templates whose name or custom variables match `query`
    ///
    /// Matching is case-insensitive on the template name and on custom
    /// variable names and labels. A trimmed query shorter than
    /// [`MIN_SEARCH_LEN`] characters lists every visible template.
    pub fn search(&self, family: Family, owner: &str, query: &str) -> Result<Vec<TemplateView>> {
        let needle = query.trim().to_lowercase();
        let templates = self.list(family, owner)?;
        if needle.chars().count() < MIN_SEARCH_LEN {
            return Ok(templates);
        }

        let hit = |text: &str| text.to_lowercase().contains(&needle);
        Ok(templates
            .into_iter()
            .filter(|view| {
                let t = &view.template;
                hit(&t.name)
                    || t
                        .variables
                        .iter()
                        .any(|v| hit(&v.name) || hit(&v.label))
            })
            .collect())
    }

    fn find_visible(&self, family: Family, id: &str, owner: &str) -> Result<Template> {
        self.store
            .find_template(family, id)?
            .filter(|t| t.is_visible_to(owner))
            .ok_or_else(|| ServiceError::template_not_found(family, id))
    }
}

/// `"<base> (copie)"`, then `"<base> (copie N)"` with N = existing copies + 1
///
/// Skips ahead while the candidate is already taken.
pub fn copy_name(base: &str, existing: &[String]) -> String {
    let prefix = format!("{} (copie", base);
    let copies = existing.iter().filter(|n| n.starts_with(&prefix)).count();
    let taken = |candidate: &str| existing.iter().any(|n| same_name(n, candidate));

    let mut n = copies + 1;
    let mut candidate = if copies == 0 {
        format!("{} (copie)", base)
    } else {
        format!("{} (copie {})", base, n)
    };
    while taken(&candidate) {
        n += 1;
        candidate = format!("{} (copie {})", base, n);
    }
    candidate
}
