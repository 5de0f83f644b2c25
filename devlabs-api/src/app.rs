/// Application state and router builder
///
/// This module defines the shared application state, the authentication
/// layers, and the function that builds the Axum router with all routes and
/// middleware.
///
/// # Example
///
/// ```no_run
/// use devlabs_api::{app::{build_router, AppState}, config::Config};
/// use devlabs_shared::store::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    middleware::{
        rate_limit::{rate_limit_layer, RateLimiter},
        security::SecurityHeadersLayer,
    },
};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use devlabs_shared::{
    auth::{
        jwt::TokenConfig,
        middleware::{authenticate, bearer_token, AuthContext},
    },
    models::user::User,
    store::Store,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

/// Largest accepted request body
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend (PostgreSQL or in-memory)
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,

    /// Token secrets and lifetimes
    pub tokens: Arc<TokenConfig>,

    /// Per-client request budget
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            tokens: Arc::new(config.token_config()),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit)),
            config: Arc::new(config),
        }
    }

    /// Loads a user that must exist, e.g. the authenticated caller
    pub async fn load_user(&self, id: Uuid) -> ApiResult<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// The router is organized as follows:
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /api/{version}/                  # Rate limited
///     ├── /auth/                       # register, login, refresh (public), verify
///     ├── /users/                      # profile, password, settings, account
///     ├── /projects/                   # CRUD + list
///     ├── /achievements/               # CRUD + list
///     ├── /portfolio/                  # data, settings, export, templates, preview
///     │   └── GET /public/:slug        # optional auth
///     └── /analytics/dashboard
/// ```
///
/// Everything except the public auth routes, `/health` and the public
/// portfolio requires a bearer access token.
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Gzip compression
/// 5. Body size limit
/// 6. Rate limiting (`/api` only)
/// 7. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    // Import route handlers
    use crate::routes::{achievements, analytics, auth, health, portfolio, projects, users};

    let require_auth = || from_fn_with_state(state.clone(), jwt_auth_layer);

    let auth_routes = Router::new()
        .route("/verify", get(auth::verify))
        .route_layer(require_auth())
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh));

    let user_routes = Router::new()
        .route("/profile", get(users::get_profile).put(users::update_profile))
        .route("/change-password", put(users::change_password))
        .route("/settings", put(users::update_settings))
        .route(
            "/portfolio-settings",
            get(users::get_portfolio_settings).put(users::update_portfolio_settings),
        )
        .route("/account", axum::routing::delete(users::delete_account))
        .route_layer(require_auth());

    let project_routes = Router::new()
        .route("/", get(projects::list_projects).post(projects::create_project))
        .route(
            "/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route_layer(require_auth());

    let achievement_routes = Router::new()
        .route(
            "/",
            get(achievements::list_achievements).post(achievements::create_achievement),
        )
        .route(
            "/:id",
            get(achievements::get_achievement)
                .put(achievements::update_achievement)
                .delete(achievements::delete_achievement),
        )
        .route_layer(require_auth());

    let portfolio_routes = Router::new()
        .route("/data", get(portfolio::get_portfolio_data))
        .route("/settings", put(portfolio::update_portfolio_settings))
        .route("/export", post(portfolio::export_portfolio))
        .route("/templates", get(portfolio::get_templates))
        .route("/preview", post(portfolio::generate_preview))
        .route_layer(require_auth())
        .merge(
            Router::new()
                .route("/public/:slug", get(portfolio::get_public_portfolio))
                .route_layer(from_fn_with_state(state.clone(), optional_auth_layer)),
        );

    let analytics_routes = Router::new()
        .route("/dashboard", get(analytics::get_dashboard))
        .route_layer(require_auth());

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/achievements", achievement_routes)
        .nest("/portfolio", portfolio_routes)
        .nest("/analytics", analytics_routes)
        .layer(from_fn_with_state(state.clone(), rate_limit_layer));

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .nest(&state.config.api_prefix(), api_routes)
        .fallback(crate::routes::not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS policy: permissive for `*`, otherwise the listed origins only
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Validates the bearer access token, checks that its user still exists,
/// then injects `AuthContext` into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), &state.tokens.access_secret)?;

    if state.store.find_user(auth.user_id).await?.is_none() {
        tracing::debug!(user_id = %auth.user_id, "Token for deleted user");
        return Err(ApiError::Unauthorized(
            "Invalid token. User not found.".to_string(),
        ));
    }

    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

/// Optional authentication layer
///
/// Like [`jwt_auth_layer`], but anonymous requests and bad tokens pass
/// through without an `AuthContext`.
async fn optional_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Ok(Some(_)) = bearer_token(req.headers()) {
        match authenticate(req.headers(), &state.tokens.access_secret) {
            Ok(auth) => {
                req.extensions_mut().insert::<AuthContext>(auth);
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring invalid optional token"),
        }
    }

    next.run(req).await
}
