use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::application::{CreateTemplateInput, CreateVersionInput, TemplateDetails, TemplateService};
use crate::domain::rendering::RenderedPrompt;
use crate::domain::repositories::{Page, Pagination, TemplateFilter};
use crate::domain::template::{Template, TemplateStatus, TemplateUpdate, Variable, Version};

/// Request body for creating a template
#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: Option<TemplateStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Label of the inline first version
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub variables: Vec<Variable>,
}

/// Request body for adding a version
#[derive(Debug, Deserialize)]
pub struct CreateVersionRequest {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub variables: Vec<Variable>,
}

/// Request body for re-pointing the current version
#[derive(Debug, Deserialize)]
pub struct SetCurrentVersionRequest {
    #[serde(default)]
    pub version: String,
}

/// Request body for rendering
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub version: Option<String>,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

/// Query string for listing templates
///
/// `tags` is a comma separated list; all tags must match.
#[derive(Debug, Default, Deserialize)]
pub struct ListTemplatesParams {
    pub status: Option<TemplateStatus>,
    pub tags: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl ListTemplatesParams {
    fn filter(&self) -> TemplateFilter {
        let tags = self
            .tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();

        TemplateFilter {
            status: self.status,
            tags,
        }
    }

    fn pagination(&self) -> Pagination {
        Pagination::new(self.page.unwrap_or(0), self.page_size.unwrap_or(0))
    }
}

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: TemplateStatus,
    pub tags: Vec<String>,
    pub metadata: HashMap<String, String>,
    pub current_version_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Template> for TemplateResponse {
    fn from(template: &Template) -> Self {
        Self {
            id: template.id(),
            name: template.name().to_string(),
            description: template.description().to_string(),
            status: template.status(),
            tags: template.tags().to_vec(),
            metadata: template.metadata().clone(),
            current_version_id: template.current_version_id(),
            created_at: template.created_at(),
            updated_at: template.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub id: Uuid,
    pub template_id: Uuid,
    pub version: String,
    pub content: String,
    pub variables: Vec<Variable>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Version> for VersionResponse {
    fn from(version: &Version) -> Self {
        Self {
            id: version.id(),
            template_id: version.template_id(),
            version: version.label().to_string(),
            content: version.content().to_string(),
            variables: version.variables().to_vec(),
            is_active: version.is_active(),
            created_at: version.created_at(),
        }
    }
}

/// Template plus its version history
#[derive(Debug, Serialize)]
pub struct TemplateDetailsResponse {
    #[serde(flatten)]
    pub template: TemplateResponse,
    pub versions: Vec<VersionResponse>,
}

impl From<&TemplateDetails> for TemplateDetailsResponse {
    fn from(details: &TemplateDetails) -> Self {
        Self {
            template: TemplateResponse::from(&details.template),
            versions: details.versions.iter().map(VersionResponse::from).collect(),
        }
    }
}

/// Create a template, optionally with its first version
///
/// POST /api/templates
pub async fn create_template(
    State(service): State<TemplateService>,
    payload: Result<Json<CreateTemplateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TemplateDetailsResponse>), ApiError> {
    let Json(req) = payload?;
    let details = service
        .create_template(CreateTemplateInput {
            name: req.name,
            description: req.description,
            status: req.status,
            tags: req.tags,
            metadata: req.metadata,
            version: req.version,
            content: req.content,
            variables: req.variables,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TemplateDetailsResponse::from(&details)),
    ))
}

/// Get a template by id or name, with its versions
///
/// GET /api/templates/:id
pub async fn get_template(
    State(service): State<TemplateService>,
    Path(reference): Path<String>,
) -> Result<Json<TemplateDetailsResponse>, ApiError> {
    let details = service.get_template(&reference).await?;
    Ok(Json(TemplateDetailsResponse::from(&details)))
}

/// List templates, newest first
///
/// GET /api/templates?status=&tags=&page=&page_size=
pub async fn list_templates(
    State(service): State<TemplateService>,
    params: Result<Query<ListTemplatesParams>, QueryRejection>,
) -> Result<Json<Page<TemplateResponse>>, ApiError> {
    let Query(params) = params?;
    let page = service
        .list_templates(params.filter(), params.pagination())
        .await?;

    Ok(Json(Page {
        items: page.items.iter().map(TemplateResponse::from).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
    }))
}

/// Update template metadata; absent fields stay unchanged
///
/// PATCH /api/templates/:id
pub async fn update_template(
    State(service): State<TemplateService>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TemplateUpdate>, JsonRejection>,
) -> Result<Json<TemplateResponse>, ApiError> {
    let Path(id) = id?;
    let Json(update) = payload?;
    let template = service.update_template(id, update).await?;
    Ok(Json(TemplateResponse::from(&template)))
}

/// Delete a template and its versions
///
/// DELETE /api/templates/:id
pub async fn delete_template(
    State(service): State<TemplateService>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    service.delete_template(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a version; it becomes the current version
///
/// POST /api/templates/:id/versions
pub async fn create_version(
    State(service): State<TemplateService>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CreateVersionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VersionResponse>), ApiError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let version = service
        .create_version(
            id,
            CreateVersionInput {
                version: req.version,
                content: req.content,
                variables: req.variables,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(VersionResponse::from(&version))))
}

/// GET /api/templates/:id/versions
pub async fn list_versions(
    State(service): State<TemplateService>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<VersionResponse>>, ApiError> {
    let Path(id) = id?;
    let versions = service.list_versions(id).await?;
    Ok(Json(versions.iter().map(VersionResponse::from).collect()))
}

/// GET /api/templates/:id/versions/:version
pub async fn get_version(
    State(service): State<TemplateService>,
    path: Result<Path<(Uuid, String)>, PathRejection>,
) -> Result<Json<VersionResponse>, ApiError> {
    let Path((id, label)) = path?;
    let version = service.get_version(id, &label).await?;
    Ok(Json(VersionResponse::from(&version)))
}

/// Pin the template to an existing version
///
/// PUT /api/templates/:id/current-version
pub async fn set_current_version(
    State(service): State<TemplateService>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SetCurrentVersionRequest>, JsonRejection>,
) -> Result<Json<TemplateResponse>, ApiError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    if req.version.is_empty() {
        return Err(ApiError::bad_request("version is required"));
    }

    let template = service.set_current_version(id, &req.version).await?;
    Ok(Json(TemplateResponse::from(&template)))
}

/// Render a template by id or name
///
/// POST /api/templates/:id/render
pub async fn render_template(
    State(service): State<TemplateService>,
    Path(reference): Path<String>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<Json<RenderedPrompt>, ApiError> {
    let Json(req) = payload?;
    let rendered = service
        .render_prompt(&reference, req.version.as_deref(), &req.variables)
        .await?;

    Ok(Json(rendered))
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_split_tags() {
        let params = ListTemplatesParams {
            tags: Some("nlp, prod,,".to_string()),
            ..Default::default()
        };

        assert_eq!(params.filter().tags, vec!["nlp".to_string(), "prod".to_string()]);
    }

    #[test]
    fn list_params_default_paging() {
        let params = ListTemplatesParams::default();

        assert_eq!(params.pagination(), Pagination::new(1, 10));
        assert!(params.filter().tags.is_empty());
        assert_eq!(params.filter().status, None);
    }
}
