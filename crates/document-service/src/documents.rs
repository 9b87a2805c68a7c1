//! Document lifecycle
//!
//! A document freezes its template's markup and effective variable
//! definitions at creation time. Later template edits never reach it:
//! value edits are merged into the frozen snapshot and re-rendered from the
//! frozen markup.
//!
//! Writes that depend on the current status only land if the status is
//! still the one they read, so concurrent edits and status changes never
//! overwrite each other.

use crate::error::{Result, ServiceError};
use crate::renderer::{DocumentRenderer, RenderedDocument};
use crate::rules::check_business_rules;
use crate::status::can_transition;
use crate::store::{ClientStore, DocumentStore, TemplateStore};
use crate::RenderError;
use chrono::{NaiveDate, Utc};
use shared_types::{Document, DocumentStatus, Family, SubmittedValue, VariableValue};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use variable_engine::values::{merge_values, parse_date, validate_submission};
use variable_engine::{catalog, render, ValueError};

#[derive(Clone)]
pub struct DocumentService {
    templates: Arc<dyn TemplateStore>,
    documents: Arc<dyn DocumentStore>,
    clients: Arc<dyn ClientStore>,
}

impl DocumentService {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        documents: Arc<dyn DocumentStore>,
        clients: Arc<dyn ClientStore>,
    ) -> Self {
        Self {
            templates,
            documents,
            clients,
        }
    }

    /// Validate `values` against a visible template and store a draft
    ///
    /// `client_id`, when given, must name one of `owner`'s clients.
    pub fn create(
        &self,
        family: Family,
        owner: &str,
        template_id: &str,
        client_id: Option<&str>,
        values: &[SubmittedValue],
    ) -> Result<Document> {
        let template = self
            .templates
            .find_template(family, template_id)?
            .filter(|t| t.is_visible_to(owner))
            .ok_or_else(|| ServiceError::template_not_found(family, template_id))?;
        if let Some(client_id) = client_id {
            self.clients
                .find_client(client_id)?
                .filter(|c| c.owner_id == owner)
                .ok_or_else(|| ServiceError::ClientNotFound(client_id.to_string()))?;
        }

        let definitions = catalog::effective_variables(family, &template.variables);
        let snapshot = validate_submission(&definitions, values)
            .and_then(|snapshot| enforce_rules(family, snapshot))
            .map_err(|err| rejected(family, err))?;

        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4().to_string(),
            family,
            owner_id: owner.to_string(),
            template_id: template.id,
            client_id: client_id.map(str::to_string),
            status: DocumentStatus::Draft,
            generated_html: render::render(&template.content_html, &snapshot),
            template_html: template.content_html,
            variable_values: snapshot,
            created_at: now,
            updated_at: now,
        };

        self.documents.insert_document(document.clone())?;
        info!(
            family = %family,
            id = %document.id,
            template = %document.template_id,
            owner,
            "created document"
        );
        Ok(document)
    }

    /// Merge `values` into a draft's snapshot and re-render it
    pub fn update_values(
        &self,
        family: Family,
        id: &str,
        owner: &str,
        values: &[SubmittedValue],
    ) -> Result<Document> {
        let document = self.get(family, id, owner)?;
        if document.status != DocumentStatus::Draft {
            return Err(ServiceError::NotEditable {
                id: id.to_string(),
                status: document.status,
            });
        }

        let snapshot = merge_values(&document.variable_values, values)
            .and_then(|snapshot| enforce_rules(family, snapshot))
            .map_err(|err| rejected(family, err))?;

        let document = Document {
            generated_html: render::render(&document.template_html, &snapshot),
            variable_values: snapshot,
            updated_at: Utc::now(),
            ..document
        };

        if !self
            .documents
            .replace_document(document.clone(), DocumentStatus::Draft)?
        {
            let current = self.get(family, id, owner)?;
            return Err(ServiceError::NotEditable {
                id: id.to_string(),
                status: current.status,
            });
        }
        info!(family = %family, id, owner, "updated document values");
        Ok(document)
    }

    pub fn get(&self, family: Family, id: &str, owner: &str) -> Result<Document> {
        self.documents
            .find_document(family, id)?
            .filter(|d| d.owner_id == owner)
            .ok_or_else(|| ServiceError::document_not_found(family, id))
    }

    pub fn list(&self, family: Family, owner: &str) -> Result<Vec<Document>> {
        Ok(self.documents.list_documents(family, owner)?)
    }

    pub fn delete(&self, family: Family, id: &str, owner: &str) -> Result<()> {
        self.get(family, id, owner)?;
        if !self.documents.delete_document(family, id)? {
            return Err(ServiceError::document_not_found(family, id));
        }
        info!(family = %family, id, owner, "deleted document");
        Ok(())
    }

    /// Manual status change; moving to the current status is a no-op
    pub fn change_status(
        &self,
        family: Family,
        id: &str,
        owner: &str,
        to: DocumentStatus,
    ) -> Result<Document> {
        let document = self.get(family, id, owner)?;
        let from = document.status;
        if from == to {
            return Ok(document);
        }
        if !can_transition(family, from, to) {
            return Err(ServiceError::InvalidTransition { family, from, to });
        }

        let document = Document {
            status: to,
            updated_at: Utc::now(),
            ..document
        };
        if !self.documents.replace_document(document.clone(), from)? {
            return Err(ServiceError::ConcurrentUpdate { id: id.to_string() });
        }
        info!(family = %family, id, %from, %to, "changed document status");
        Ok(document)
    }

    /// Flag every sent invoice due before `today` as overdue
    ///
    /// Returns the number of invoices updated.
    pub fn mark_overdue(&self, today: NaiveDate) -> Result<usize> {
        let mut updated = 0;
        for document in self.documents.all_documents(Family::Invoice)? {
            if document.status != DocumentStatus::Sent {
                continue;
            }
            let due = document.value_of("due_date").and_then(parse_date);
            if !matches!(due, Some(due) if due < today) {
                continue;
            }

            let id = document.id.clone();
            let swapped = self.documents.replace_document(
                Document {
                    status: DocumentStatus::Overdue,
                    updated_at: Utc::now(),
                    ..document
                },
                DocumentStatus::Sent,
            )?;
            // paid or cancelled since the listing
            if swapped {
                info!(id = %id, "invoice is overdue");
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Hand the generated markup to the rendering collaborator
    pub fn render(
        &self,
        family: Family,
        id: &str,
        owner: &str,
        renderer: &dyn DocumentRenderer,
    ) -> Result<RenderedDocument> {
        let document = self.get(family, id, owner)?;
        if document.generated_html.trim().is_empty() {
            return Err(RenderError::EmptyDocument(document.id).into());
        }
        Ok(renderer.render(&document.generated_html)?)
    }
}

fn enforce_rules(
    family: Family,
    snapshot: Vec<VariableValue>,
) -> std::result::Result<Vec<VariableValue>, ValueError> {
    ValueError::check(check_business_rules(family, &snapshot))?;
    Ok(snapshot)
}

fn rejected(family: Family, err: ValueError) -> ServiceError {
    warn!(
        family = %family,
        violations = err.violations.len(),
        "rejected document values: {}",
        err
    );
    ServiceError::Values(err)
}
