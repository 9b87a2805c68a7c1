//! Request and response bodies

use serde::{Deserialize, Serialize};
use shared_types::{Family, SubmittedValue, VariableDefinition};

/// Catalog of a family's system variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariablesResponse {
    pub family: Family,
    pub variables: Vec<VariableDefinition>,
}

/// Result of a template dry-run validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    /// Effective variable set the template would have
    pub variables: Vec<VariableDefinition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocumentRequest {
    #[serde(alias = "templateId")]
    pub template_id: String,
    #[serde(default, alias = "clientId")]
    pub client_id: Option<String>,
    #[serde(default, alias = "variableValues")]
    pub variables: Vec<SubmittedValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDocumentRequest {
    #[serde(default, alias = "variableValues")]
    pub variables: Vec<SubmittedValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// Stateless preview: markup plus raw values
#[derive(Debug, Clone, Deserialize)]
pub struct RenderRequest {
    #[serde(alias = "contentHtml")]
    pub html: String,
    #[serde(default, alias = "variableValues")]
    pub variables: Vec<SubmittedValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResponse {
    pub html: String,
    /// Placeholders left in `html`, in document order
    pub unresolved: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorMarkupResponse {
    pub html: String,
}
