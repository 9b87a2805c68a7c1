//! HTTP handlers for the back-office API

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    Json,
};
use document_service::{ClientDraft, TemplateDraft, TemplateView};
use shared_types::{Client, Document, DocumentStatus, Family};
use std::sync::Arc;
use variable_engine::{catalog, extract, render};

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

/// Header carrying the caller's user id
pub const USER_HEADER: &str = "x-user-id";

/// Authenticated caller, taken from [`USER_HEADER`]
#[derive(Debug, Clone)]
pub struct Caller(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Caller(value.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}

fn family(raw: &str) -> Result<Family, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::UnknownFamily(raw.to_string()))
}

fn check_size(state: &AppState, html: &str) -> Result<(), ApiError> {
    let limit = state.config.max_template_bytes;
    if html.len() > limit {
        return Err(ApiError::PayloadTooLarge {
            size: html.len(),
            limit,
        });
    }
    Ok(())
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
) -> Result<Json<Vec<Client>>, ApiError> {
    Ok(Json(state.clients.list(&owner)?))
}

pub async fn search_clients(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Client>>, ApiError> {
    Ok(Json(state.clients.search(&owner, &query.q)?))
}

pub async fn create_client(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Json(draft): Json<ClientDraft>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let client = state.clients.create(&owner, draft)?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path(id): Path<String>,
) -> Result<Json<Client>, ApiError> {
    Ok(Json(state.clients.get(&id, &owner)?))
}

pub async fn update_client(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path(id): Path<String>,
    Json(draft): Json<ClientDraft>,
) -> Result<Json<Client>, ApiError> {
    Ok(Json(state.clients.update(&id, &owner, draft)?))
}

pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.clients.delete(&id, &owner)?;
    Ok(StatusCode::NO_CONTENT)
}

/// System variable catalog of a family
pub async fn system_variables(
    Path(raw): Path<String>,
) -> Result<Json<VariablesResponse>, ApiError> {
    let family = family(&raw)?;
    Ok(Json(VariablesResponse {
        family,
        variables: catalog::system_variables(family),
    }))
}

/// Dry-run of the full template validation
pub async fn validate_template(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path(raw): Path<String>,
    Json(draft): Json<TemplateDraft>,
) -> Result<Json<ValidationResponse>, ApiError> {
    let family = family(&raw)?;
    check_size(&state, &draft.content_html)?;
    let custom = state.templates.validate(family, &owner, &draft, None)?;
    Ok(Json(ValidationResponse {
        valid: true,
        variables: catalog::effective_variables(family, &custom),
    }))
}

pub async fn list_templates(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path(raw): Path<String>,
) -> Result<Json<Vec<TemplateView>>, ApiError> {
    Ok(Json(state.templates.list(family(&raw)?, &owner)?))
}

pub async fn search_templates(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path(raw): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<TemplateView>>, ApiError> {
    Ok(Json(state.templates.search(family(&raw)?, &owner, &query.q)?))
}

pub async fn create_template(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path(raw): Path<String>,
    Json(draft): Json<TemplateDraft>,
) -> Result<(StatusCode, Json<TemplateView>), ApiError> {
    let family = family(&raw)?;
    check_size(&state, &draft.content_html)?;
    let view = state.templates.create(family, &owner, draft)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_template(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path((raw, id)): Path<(String, String)>,
) -> Result<Json<TemplateView>, ApiError> {
    Ok(Json(state.templates.get(family(&raw)?, &id, &owner)?))
}

/// Template markup with placeholders turned into editor chips
pub async fn editor_markup(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path((raw, id)): Path<(String, String)>,
) -> Result<Json<EditorMarkupResponse>, ApiError> {
    let view = state.templates.get(family(&raw)?, &id, &owner)?;
    Ok(Json(EditorMarkupResponse {
        html: render::to_chips(&view.template.content_html, &view.effective_variables),
    }))
}

pub async fn update_template(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path((raw, id)): Path<(String, String)>,
    Json(draft): Json<TemplateDraft>,
) -> Result<Json<TemplateView>, ApiError> {
    let family = family(&raw)?;
    check_size(&state, &draft.content_html)?;
    Ok(Json(state.templates.update(family, &id, &owner, draft)?))
}

pub async fn delete_template(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path((raw, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.templates.delete(family(&raw)?, &id, &owner)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn duplicate_template(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path((raw, id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<TemplateView>), ApiError> {
    let view = state.templates.duplicate(family(&raw)?, &id, &owner)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path(raw): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(state.documents.list(family(&raw)?, &owner)?))
}

pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path(raw): Path<String>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let document = state.documents.create(
        family(&raw)?,
        &owner,
        &req.template_id,
        req.client_id.as_deref(),
        &req.variables,
    )?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path((raw, id)): Path<(String, String)>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.documents.get(family(&raw)?, &id, &owner)?))
}

pub async fn update_document(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path((raw, id)): Path<(String, String)>,
    Json(req): Json<UpdateDocumentRequest>,
) -> Result<Json<Document>, ApiError> {
    let document = state
        .documents
        .update_values(family(&raw)?, &id, &owner, &req.variables)?;
    Ok(Json(document))
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path((raw, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.documents.delete(family(&raw)?, &id, &owner)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_status(
    State(state): State<Arc<AppState>>,
    Caller(owner): Caller,
    Path((raw, id)): Path<(String, String)>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Document>, ApiError> {
    let family = family(&raw)?;
    let status: DocumentStatus = req
        .status
        .parse()
        .map_err(|e: shared_types::ParseEnumError| ApiError::InvalidRequest(e.to_string()))?;
    Ok(Json(
        state.documents.change_status(family, &id, &owner, status)?,
    ))
}

/// Substitute raw values into markup without storing anything
pub async fn render_preview(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, ApiError> {
    check_size(&state, &req.html)?;
    let html = render::substitute_submitted(&render::chips_to_placeholders(&req.html), &req.variables);
    let unresolved = extract::extract_variable_names(&html);
    Ok(Json(RenderResponse { html, unresolved }))
}
