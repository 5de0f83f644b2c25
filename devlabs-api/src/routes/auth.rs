/// Authentication endpoints
///
/// This module provides user authentication endpoints:
/// - Registration
/// - Login
/// - Token verification
/// - Token refresh
///
/// # Endpoints
///
/// - `POST /api/v1/auth/register` - Register new user
/// - `POST /api/v1/auth/login` - Login and get tokens
/// - `GET /api/v1/auth/verify` - Check an access token (authenticated)
/// - `POST /api/v1/auth/refresh` - Exchange a refresh token for an access token
///
/// Password hashing runs on the blocking thread pool; Argon2id at the
/// default cost takes long enough to stall an async worker.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::JsonBody,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use devlabs_shared::{
    auth::{
        jwt::refresh_access_token,
        middleware::AuthContext,
        password::{hash_password, verify_or_dummy, PasswordParams, MIN_PASSWORD_LENGTH},
    },
    models::user::{normalize_email, NewUser, Preferences, Profile, Settings, User},
    slug::{base_slug, insert_with_unique_slug},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[validate(length(
        min = MIN_PASSWORD_LENGTH,
        message = "Password must be at least 6 characters"
    ))]
    pub password: String,

    #[serde(deserialize_with = "devlabs_shared::models::trimmed")]
    #[validate(length(min = 2, max = 50, message = "First name must be 2-50 characters"))]
    pub first_name: String,

    #[serde(deserialize_with = "devlabs_shared::models::trimmed")]
    #[validate(length(min = 2, max = 50, message = "Last name must be 2-50 characters"))]
    pub last_name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// User as returned by the auth endpoints: the profile fields flattened next
/// to the account fields
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: Uuid,

    pub email: String,

    #[serde(flatten)]
    pub profile: Profile,

    pub portfolio_slug: String,

    pub settings: Settings,

    pub preferences: Preferences,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            profile: user.profile,
            portfolio_slug: user.settings.portfolio_slug.clone(),
            settings: user.settings,
            preferences: user.preferences,
        }
    }
}

/// Register and login response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub message: String,

    pub user: AuthUser,

    /// Access token
    pub token: String,

    pub refresh_token: String,
}

/// Token verification response
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: AuthUser,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token
    pub token: String,
}

/// Hashes a password off the async runtime
pub(crate) async fn hash_blocking(password: String, params: PasswordParams) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password, &params))
        .await
        .map_err(|e| ApiError::InternalError(format!("Hashing task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Verifies a password off the async runtime
///
/// With no stored hash, burns the same work as a real check and reports a
/// mismatch.
pub(crate) async fn verify_blocking(
    password: String,
    hash: Option<String>,
    params: PasswordParams,
) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || verify_or_dummy(&password, hash.as_deref(), &params))
        .await
        .map_err(|e| ApiError::InternalError(format!("Verification task failed: {}", e)))?
        .map_err(ApiError::from)
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".to_string())
}

/// Register a new user
///
/// Creates the account with default settings and a portfolio slug derived
/// from the name (`ada-lovelace`, then `ada-lovelace-1`, ...).
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "secret1",
///   "firstName": "Ada",
///   "lastName": "Lovelace"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or the email is already registered
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    let email = normalize_email(&req.email);
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::BadRequest("User already exists".to_string()));
    }

    let password_hash = hash_blocking(req.password, state.config.password).await?;

    // A concurrent registration with the same email still fails here, on the
    // unique constraint
    let user = insert_with_unique_slug(
        state.store.as_ref(),
        NewUser {
            email,
            password_hash,
            portfolio_slug: base_slug(&req.first_name, &req.last_name),
            profile: Profile::named(req.first_name, req.last_name),
        },
    )
    .await?;

    let tokens = state.tokens.issue_pair(user.id, &user.email)?;

    tracing::info!(
        user_id = %user.id,
        slug = %user.settings.portfolio_slug,
        "User registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: user.into(),
            token: tokens.token,
            refresh_token: tokens.refresh_token,
        }),
    ))
}

/// Login endpoint
///
/// Authenticates a user and returns JWT tokens.
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "secret1"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Unknown email or wrong password (same response)
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let email = normalize_email(&req.email);
    let user = state.store.find_user_by_email(&email).await?;

    let valid = verify_blocking(
        req.password,
        user.as_ref().map(|u| u.password_hash.clone()),
        state.config.password,
    )
    .await?;

    let mut user = match user {
        Some(user) if valid => user,
        _ => {
            tracing::info!("Failed login attempt");
            return Err(invalid_credentials());
        }
    };

    let now = Utc::now();
    state.store.record_login(user.id, now).await?;
    user.last_login_at = Some(now);

    let tokens = state.tokens.issue_pair(user.id, &user.email)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: user.into(),
        token: tokens.token,
        refresh_token: tokens.refresh_token,
    }))
}

/// Token verification endpoint
///
/// Reaching the handler means the auth layer accepted the token.
pub async fn verify(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<VerifyResponse>> {
    let user = state.load_user(auth.user_id).await?;

    Ok(Json(VerifyResponse {
        valid: true,
        user: user.into(),
    }))
}

/// Token refresh endpoint
///
/// Exchanges a refresh token for a new access token.
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/refresh
/// Content-Type: application/json
///
/// { "refreshToken": "eyJ..." }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token, or the user no
///   longer exists
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let (user_id, token) = refresh_access_token(&req.refresh_token, &state.tokens)?;

    if state.store.find_user(user_id).await?.is_none() {
        return Err(ApiError::Unauthorized("Invalid refresh token".to_string()));
    }

    Ok(Json(RefreshResponse { token }))
}
