/// Project endpoints
///
/// Every query is scoped to the authenticated caller; someone else's project
/// id answers 404 exactly like an unknown one.
///
/// # Endpoints
///
/// - `GET /api/v1/projects?page&limit&category&status&featured&search`
/// - `POST /api/v1/projects`
/// - `GET /api/v1/projects/:id`
/// - `PUT /api/v1/projects/:id` (full replacement)
/// - `DELETE /api/v1/projects/:id`

use super::MessageResponse;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{JsonBody, PathParam, QueryParams},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use devlabs_shared::{
    auth::middleware::AuthContext,
    models::project::{Project, ProjectCategory, ProjectData, ProjectFilter, ProjectStatus},
    pagination::{PageRequest, Pagination},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Query string of the list endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ListProjectsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<ProjectCategory>,
    pub status: Option<ProjectStatus>,
    pub featured: Option<bool>,
    pub search: Option<String>,
}

impl ListProjectsQuery {
    fn filter(&self) -> ProjectFilter {
        ProjectFilter {
            category: self.category,
            status: self.status,
            featured: self.featured,
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct ProjectSavedResponse {
    pub message: String,
    pub project: Project,
}

fn project_not_found() -> ApiError {
    ApiError::NotFound("Project not found".to_string())
}

/// Lists the caller's projects, featured first, then newest first
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    QueryParams(query): QueryParams<ListProjectsQuery>,
) -> ApiResult<Json<ProjectListResponse>> {
    let request = PageRequest::new(query.page, query.limit);
    let page = state
        .store
        .list_projects(auth.user_id, &query.filter(), request)
        .await?;

    Ok(Json(ProjectListResponse {
        pagination: Pagination::new(request, page.total),
        projects: page.items,
    }))
}

/// Creates a project
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(data): JsonBody<ProjectData>,
) -> ApiResult<(StatusCode, Json<ProjectSavedResponse>)> {
    data.validate()?;

    let project = state.store.create_project(auth.user_id, data).await?;

    tracing::info!(user_id = %auth.user_id, project_id = %project.id, "Project created");

    Ok((
        StatusCode::CREATED,
        Json(ProjectSavedResponse {
            message: "Project created successfully".to_string(),
            project,
        }),
    ))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = state
        .store
        .get_project(auth.user_id, id)
        .await?
        .ok_or_else(project_not_found)?;

    Ok(Json(ProjectResponse { project }))
}

/// Replaces a project's editable fields
///
/// Metrics, owner and creation time are kept.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(data): JsonBody<ProjectData>,
) -> ApiResult<Json<ProjectSavedResponse>> {
    data.validate()?;

    let project = state
        .store
        .update_project(auth.user_id, id, data)
        .await?
        .ok_or_else(project_not_found)?;

    Ok(Json(ProjectSavedResponse {
        message: "Project updated successfully".to_string(),
        project,
    }))
}

/// Deletes a project; achievements linked to it lose the link
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !state.store.delete_project(auth.user_id, id).await? {
        return Err(project_not_found());
    }

    tracing::info!(user_id = %auth.user_id, project_id = %id, "Project deleted");

    Ok(Json(MessageResponse::new("Project deleted successfully")))
}
