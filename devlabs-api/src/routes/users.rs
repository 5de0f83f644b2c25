/// Account management endpoints
///
/// All routes act on the authenticated caller.
///
/// # Endpoints
///
/// - `GET /api/v1/users/profile`
/// - `PUT /api/v1/users/profile`
/// - `PUT /api/v1/users/change-password`
/// - `PUT /api/v1/users/settings`
/// - `GET /api/v1/users/portfolio-settings`
/// - `PUT /api/v1/users/portfolio-settings`
/// - `DELETE /api/v1/users/account`

use super::{
    auth::{hash_blocking, verify_blocking},
    MessageResponse,
};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::JsonBody,
};
use axum::{extract::State, Extension, Json};
use devlabs_shared::{
    auth::{middleware::AuthContext, password::MIN_PASSWORD_LENGTH},
    models::user::{Profile, Settings, SettingsPatch, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UserUpdatedResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: Settings,
}

#[derive(Debug, Serialize)]
pub struct SettingsUpdatedResponse {
    pub message: String,
    pub settings: Settings,
}

/// Password change request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(
        min = MIN_PASSWORD_LENGTH,
        message = "New password must be at least 6 characters long"
    ))]
    pub new_password: String,
}

/// Validates and applies a partial settings update
///
/// Shared by `/users/settings` and `/users/portfolio-settings`.
async fn merge_settings(state: &AppState, user_id: Uuid, patch: SettingsPatch) -> ApiResult<User> {
    patch.validate()?;

    let current = state.load_user(user_id).await?;
    let settings = current.settings.merge(patch);

    let user = state
        .store
        .update_settings(user_id, settings)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if user.settings.portfolio_slug != current.settings.portfolio_slug {
        tracing::info!(
            user_id = %user_id,
            slug = %user.settings.portfolio_slug,
            "Portfolio slug changed"
        );
    }

    Ok(user)
}

/// Returns the caller's full account
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    let user = state.load_user(auth.user_id).await?;
    Ok(Json(UserResponse { user }))
}

/// Replaces the caller's profile
///
/// The avatar is kept when the request leaves it out.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(mut profile): JsonBody<Profile>,
) -> ApiResult<Json<UserUpdatedResponse>> {
    profile.validate()?;

    if profile.avatar.is_none() {
        profile.avatar = state.load_user(auth.user_id).await?.profile.avatar;
    }

    let user = state
        .store
        .update_profile(auth.user_id, profile)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserUpdatedResponse {
        message: "Profile updated successfully".to_string(),
        user,
    }))
}

/// Changes the caller's password after checking the current one
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or the current password is wrong
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    let user = state.load_user(auth.user_id).await?;
    let params = state.config.password;

    if !verify_blocking(req.current_password, Some(user.password_hash), params).await? {
        return Err(ApiError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let password_hash = hash_blocking(req.new_password, params).await?;
    if !state.store.update_password(user.id, &password_hash).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// Partially updates the caller's settings
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or the slug belongs to another user
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(patch): JsonBody<SettingsPatch>,
) -> ApiResult<Json<UserUpdatedResponse>> {
    let user = merge_settings(&state, auth.user_id, patch).await?;

    Ok(Json(UserUpdatedResponse {
        message: "Settings updated successfully".to_string(),
        user,
    }))
}

pub async fn get_portfolio_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<SettingsResponse>> {
    let user = state.load_user(auth.user_id).await?;
    Ok(Json(SettingsResponse {
        settings: user.settings,
    }))
}

pub async fn update_portfolio_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(patch): JsonBody<SettingsPatch>,
) -> ApiResult<Json<SettingsUpdatedResponse>> {
    let user = merge_settings(&state, auth.user_id, patch).await?;

    Ok(Json(SettingsUpdatedResponse {
        message: "Portfolio settings updated successfully".to_string(),
        settings: user.settings,
    }))
}

/// Deletes the caller's account with all their projects and achievements
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MessageResponse>> {
    if !state.store.delete_user(auth.user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %auth.user_id, "Account deleted");

    Ok(Json(MessageResponse::new("Account deleted successfully")))
}
