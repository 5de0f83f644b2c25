/// Dashboard statistics
///
/// # Endpoint
///
/// ```text
/// GET /api/v1/analytics/dashboard
/// Authorization: Bearer <token>
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use chrono::Utc;
use devlabs_shared::{
    analytics::{dashboard_stats, views_window_start, DashboardStats},
    auth::middleware::AuthContext,
    models::{achievement::AchievementFilter, project::ProjectFilter},
};

/// Counts, monthly views and top technologies over all of the caller's data
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DashboardStats>> {
    let now = Utc::now();
    let user = state.load_user(auth.user_id).await?;

    let projects = state
        .store
        .all_projects(user.id, &ProjectFilter::default())
        .await?;
    let achievements = state
        .store
        .all_achievements(user.id, &AchievementFilter::default())
        .await?;
    let views = state
        .store
        .views_since(user.id, views_window_start(now))
        .await?;

    Ok(Json(dashboard_stats(
        &projects,
        &achievements,
        user.portfolio_views,
        &views,
        now,
    )))
}
