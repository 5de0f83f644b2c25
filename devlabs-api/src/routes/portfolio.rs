/// Portfolio endpoints
///
/// The portfolio page shows a user's featured projects and achievements.
/// Owners manage it through the authenticated routes; anyone can read a
/// public one by slug.
///
/// # Endpoints
///
/// - `GET /api/v1/portfolio/data`
/// - `PUT /api/v1/portfolio/settings` (full settings)
/// - `POST /api/v1/portfolio/export`
/// - `GET /api/v1/portfolio/templates`
/// - `POST /api/v1/portfolio/preview`
/// - `GET /api/v1/portfolio/public/:slug` (optional auth)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{JsonBody, PathParam},
};
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use devlabs_shared::{
    auth::middleware::AuthContext,
    models::{
        achievement::{Achievement, AchievementFilter},
        project::{Project, ProjectFilter},
        user::{Profile, Settings, Theme, User},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Everything the portfolio page renders
#[derive(Debug, Serialize)]
pub struct PortfolioData<U> {
    pub user: U,
    pub projects: Vec<Project>,
    pub achievements: Vec<Achievement>,
}

#[derive(Debug, Serialize)]
pub struct SettingsUpdatedResponse {
    pub message: String,
    pub settings: Settings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    #[serde(flatten)]
    pub portfolio: PortfolioData<User>,
    pub export_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub message: String,
    pub data: ExportData,
}

/// Portfolio theme as offered to the client
#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub preview: String,
    pub features: [&'static str; 3],
}

#[derive(Debug, Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<Template>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub settings: Settings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewData {
    #[serde(flatten)]
    pub portfolio: PortfolioData<User>,
    pub is_preview: bool,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub message: String,
    pub preview: PreviewData,
}

/// User as shown on a public portfolio
///
/// The email is only present when the owner opted in with `showEmail`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    pub profile: Profile,

    pub settings: Settings,

    pub portfolio_views: i64,

    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.preferences.show_email.then_some(user.email),
            profile: user.profile,
            settings: user.settings,
            portfolio_views: user.portfolio_views,
            created_at: user.created_at,
        }
    }
}

/// Static description of each theme
pub fn templates() -> Vec<Template> {
    Theme::ALL
        .iter()
        .map(|theme| {
            let (name, description, features) = match theme {
                Theme::Modern => (
                    "Modern",
                    "Contemporary, clean design with modern typography",
                    ["Clean layout", "Modern typography", "Card-based design"],
                ),
                Theme::Professional => (
                    "Professional",
                    "Business-focused layout for corporate environments",
                    ["Professional appearance", "Structured layout", "Corporate friendly"],
                ),
                Theme::Creative => (
                    "Creative",
                    "Bold, innovative presentation with unique styling",
                    ["Bold design", "Creative elements", "Unique styling"],
                ),
                Theme::Minimal => (
                    "Minimal",
                    "Clean, typography-focused minimal design",
                    ["Minimal design", "Typography focus", "Clean layout"],
                ),
            };

            Template {
                id: theme.as_str(),
                name,
                description,
                preview: format!("/templates/{}-preview.png", theme.as_str()),
                features,
            }
        })
        .collect()
}

/// Featured projects (newest first) and achievements (most recent first)
async fn featured_items(
    state: &AppState,
    user_id: Uuid,
) -> ApiResult<(Vec<Project>, Vec<Achievement>)> {
    let projects = state
        .store
        .all_projects(user_id, &ProjectFilter::featured())
        .await?;
    let achievements = state
        .store
        .all_achievements(user_id, &AchievementFilter::featured())
        .await?;

    Ok((projects, achievements))
}

/// The caller's own portfolio content
async fn own_portfolio(state: &AppState, user_id: Uuid) -> ApiResult<PortfolioData<User>> {
    let user = state.load_user(user_id).await?;
    let (projects, achievements) = featured_items(state, user_id).await?;

    Ok(PortfolioData {
        user,
        projects,
        achievements,
    })
}

pub async fn get_portfolio_data(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<PortfolioData<User>>> {
    Ok(Json(own_portfolio(&state, auth.user_id).await?))
}

/// Replaces the caller's settings wholesale
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or the slug belongs to another user
pub async fn update_portfolio_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(settings): JsonBody<Settings>,
) -> ApiResult<Json<SettingsUpdatedResponse>> {
    settings.validate()?;

    let user = state
        .store
        .update_settings(auth.user_id, settings)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(SettingsUpdatedResponse {
        message: "Portfolio settings updated successfully".to_string(),
        settings: user.settings,
    }))
}

/// Export data of the caller's portfolio
pub async fn export_portfolio(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ExportResponse>> {
    let portfolio = own_portfolio(&state, auth.user_id).await?;

    Ok(Json(ExportResponse {
        message: "Portfolio export data prepared".to_string(),
        data: ExportData {
            portfolio,
            export_date: Utc::now(),
        },
    }))
}

pub async fn get_templates() -> Json<TemplatesResponse> {
    Json(TemplatesResponse {
        templates: templates(),
    })
}

/// Renders the caller's portfolio under unsaved settings
pub async fn generate_preview(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(req): JsonBody<PreviewRequest>,
) -> ApiResult<Json<PreviewResponse>> {
    req.settings.validate()?;

    let mut portfolio = own_portfolio(&state, auth.user_id).await?;
    portfolio.user.settings = req.settings;

    Ok(Json(PreviewResponse {
        message: "Portfolio preview generated".to_string(),
        preview: PreviewData {
            portfolio,
            is_preview: true,
        },
    }))
}

/// Public portfolio by slug
///
/// Only public portfolios are served; a private one answers 404 like an
/// unknown slug. Sections the owner switched off come back empty. Every
/// visit by someone other than the owner counts as a view.
pub async fn get_public_portfolio(
    State(state): State<AppState>,
    viewer: Option<Extension<AuthContext>>,
    PathParam(slug): PathParam<String>,
) -> ApiResult<Json<PortfolioData<PublicUser>>> {
    let mut user = state
        .store
        .find_user_by_slug(&slug)
        .await?
        .filter(|user| user.settings.is_public)
        .ok_or_else(|| ApiError::NotFound("Portfolio not found or not public".to_string()))?;

    let viewer = viewer.map(|Extension(auth)| auth.user_id);
    if !user.is_owned_by(viewer) {
        state.store.record_view(user.id, Utc::now()).await?;
        user.portfolio_views += 1;
    }

    let (mut projects, mut achievements) = featured_items(&state, user.id).await?;
    let sections = user.settings.customization.show_section;
    if !sections.projects {
        projects.clear();
    }
    if !sections.achievements {
        achievements.clear();
    }

    Ok(Json(PortfolioData {
        user: user.into(),
        projects,
        achievements,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use devlabs_shared::models::user::{NewUser, Profile};

    fn user(show_email: bool) -> User {
        let mut user = NewUser {
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            profile: Profile::named("Ada", "Lovelace"),
            portfolio_slug: "ada-lovelace".to_string(),
        }
        .into_user(Uuid::new_v4(), Utc::now());
        user.preferences.show_email = show_email;
        user
    }

    #[test]
    fn test_public_user_hides_email_by_default() {
        let json = serde_json::to_value(PublicUser::from(user(false))).unwrap();
        assert!(json.get("email").is_none());
        assert!(json.get("passwordHash").is_none());

        let json = serde_json::to_value(PublicUser::from(user(true))).unwrap();
        assert_eq!(json["email"], "ada@example.com");
    }

    #[test]
    fn test_templates_cover_every_theme() {
        let templates = templates();
        let ids: Vec<&str> = templates.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["modern", "professional", "creative", "minimal"]);
        assert_eq!(templates[3].preview, "/templates/minimal-preview.png");
    }
}
