/// Achievement endpoints
///
/// Scoped to the authenticated caller like the project endpoints. An
/// achievement may link one of the caller's own projects through `projectId`.
///
/// # Endpoints
///
/// - `GET /api/v1/achievements?page&limit&type&category&featured`
/// - `POST /api/v1/achievements`
/// - `GET /api/v1/achievements/:id`
/// - `PUT /api/v1/achievements/:id`
/// - `DELETE /api/v1/achievements/:id`

use super::MessageResponse;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{JsonBody, PathParam, QueryParams},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use devlabs_shared::{
    auth::middleware::AuthContext,
    models::achievement::{
        Achievement, AchievementData, AchievementFilter, AchievementType, AchievementWithProject,
    },
    pagination::{PageRequest, Pagination},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Query string of the list endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ListAchievementsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,

    #[serde(rename = "type")]
    pub kind: Option<AchievementType>,

    pub category: Option<String>,
    pub featured: Option<bool>,
}

impl ListAchievementsQuery {
    fn filter(&self) -> AchievementFilter {
        AchievementFilter {
            kind: self.kind,
            category: self
                .category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            featured: self.featured,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AchievementListResponse {
    pub achievements: Vec<AchievementWithProject>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct AchievementResponse {
    pub achievement: Achievement,
}

#[derive(Debug, Serialize)]
pub struct AchievementSavedResponse {
    pub message: String,
    pub achievement: Achievement,
}

fn achievement_not_found() -> ApiError {
    ApiError::NotFound("Achievement not found".to_string())
}

/// Validates the payload, including that a linked project is the caller's
async fn check_payload(state: &AppState, user_id: Uuid, data: &AchievementData) -> ApiResult<()> {
    data.validate()?;

    if let Some(project_id) = data.project_id {
        if state.store.get_project(user_id, project_id).await?.is_none() {
            return Err(ApiError::invalid_field(
                "projectId",
                "Linked project not found",
            ));
        }
    }

    Ok(())
}

/// Lists the caller's achievements, featured first, then most recent first
pub async fn list_achievements(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    QueryParams(query): QueryParams<ListAchievementsQuery>,
) -> ApiResult<Json<AchievementListResponse>> {
    let request = PageRequest::new(query.page, query.limit);
    let page = state
        .store
        .list_achievements(auth.user_id, &query.filter(), request)
        .await?;

    Ok(Json(AchievementListResponse {
        pagination: Pagination::new(request, page.total),
        achievements: page.items,
    }))
}

/// Creates an achievement
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or `projectId` is not the caller's
pub async fn create_achievement(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(data): JsonBody<AchievementData>,
) -> ApiResult<(StatusCode, Json<AchievementSavedResponse>)> {
    check_payload(&state, auth.user_id, &data).await?;

    let achievement = state.store.create_achievement(auth.user_id, data).await?;

    tracing::info!(
        user_id = %auth.user_id,
        achievement_id = %achievement.id,
        "Achievement created"
    );

    Ok((
        StatusCode::CREATED,
        Json(AchievementSavedResponse {
            message: "Achievement created successfully".to_string(),
            achievement,
        }),
    ))
}

pub async fn get_achievement(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<AchievementResponse>> {
    let achievement = state
        .store
        .get_achievement(auth.user_id, id)
        .await?
        .ok_or_else(achievement_not_found)?;

    Ok(Json(AchievementResponse { achievement }))
}

pub async fn update_achievement(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(data): JsonBody<AchievementData>,
) -> ApiResult<Json<AchievementSavedResponse>> {
    check_payload(&state, auth.user_id, &data).await?;

    let achievement = state
        .store
        .update_achievement(auth.user_id, id, data)
        .await?
        .ok_or_else(achievement_not_found)?;

    Ok(Json(AchievementSavedResponse {
        message: "Achievement updated successfully".to_string(),
        achievement,
    }))
}

pub async fn delete_achievement(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !state.store.delete_achievement(auth.user_id, id).await? {
        return Err(achievement_not_found());
    }

    Ok(Json(MessageResponse::new("Achievement deleted successfully")))
}
