//! Error types for the template and document services

use shared_types::{DocumentStatus, Family};
use thiserror::Error;
use variable_engine::{SchemaError, ValueError};

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Failures reported by a storage collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Uniqueness constraint hit; `key` is the conflicting template name or
    /// client e-mail
    #[error("Uniqueness constraint violated for {resource} \"{key}\"")]
    Conflict { resource: Resource, key: String },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Failures reported by a rendering collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Rendering failed: {0}")]
    Failed(String),

    #[error("Document {0} has no generated content")]
    EmptyDocument(String),
}

/// What a `NotFound` refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Template,
    Document,
    Client,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Template => f.write_str("template"),
            Resource::Document => f.write_str("document"),
            Resource::Client => f.write_str("client"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Values(#[from] ValueError),

    #[error("{family} {resource} not found: {id}")]
    NotFound {
        family: Family,
        resource: Resource,
        id: String,
    },

    #[error("A template named \"{0}\" already exists")]
    DuplicateTemplateName(String),

    #[error("\"{0}\" is reserved for the built-in default template")]
    ReservedTemplateName(String),

    #[error("The default template cannot be modified or deleted")]
    ImmutableTemplate,

    #[error("Template name must not be empty")]
    EmptyTemplateName,

    #[error("Document {id} is {status} and can no longer be edited")]
    NotEditable { id: String, status: DocumentStatus },

    #[error("A {family} cannot go from {from} to {to}")]
    InvalidTransition {
        family: Family,
        from: DocumentStatus,
        to: DocumentStatus,
    },

    #[error("Document {id} was changed by another request")]
    ConcurrentUpdate { id: String },

    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("A client with e-mail \"{0}\" already exists")]
    DuplicateClientEmail(String),

    #[error("Invalid client {field}: {message}")]
    InvalidClient {
        field: &'static str,
        message: String,
    },

    #[error("Storage error: {0}")]
    Store(StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl ServiceError {
    pub fn template_not_found(family: Family, id: &str) -> Self {
        ServiceError::NotFound {
            family,
            resource: Resource::Template,
            id: id.to_string(),
        }
    }

    pub fn document_not_found(family: Family, id: &str) -> Self {
        ServiceError::NotFound {
            family,
            resource: Resource::Document,
            id: id.to_string(),
        }
    }

    /// True for failures the caller can fix by changing its request
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ServiceError::Store(_) | ServiceError::Render(_))
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            // a lost check-then-insert race is the same user mistake
            StoreError::Conflict {
                resource: Resource::Template,
                key,
            } => ServiceError::DuplicateTemplateName(key),
            StoreError::Conflict {
                resource: Resource::Client,
                key,
            } => ServiceError::DuplicateClientEmail(key),
            other => ServiceError::Store(other),
        }
    }
}
