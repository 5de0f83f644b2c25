/// Common test utilities for integration tests
///
/// Every test gets its own in-memory store and router, so tests run in
/// parallel without sharing data. Password hashing uses a tiny Argon2 cost
/// to keep registration fast.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use devlabs_api::{
    app::{build_router, AppState},
    config::Config,
};
use devlabs_shared::store::MemoryStore;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "secret123";

/// Test context holding the router under test
pub struct TestContext {
    pub app: Router,
    pub config: Config,
}

/// A registered user with live tokens
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub slug: String,
    pub token: String,
    pub refresh_token: String,
}

impl TestContext {
    /// Creates a context with a generous rate limit
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// Creates a context with extra configuration variables
    pub fn with_env(overrides: &[(&str, &str)]) -> Self {
        let mut vars: HashMap<String, String> = [
            ("JWT_SECRET", "test-access-secret-0123456789abcdef"),
            ("JWT_REFRESH_SECRET", "test-refresh-secret-0123456789abcdef"),
            ("PASSWORD_MEMORY_KIB", "1024"),
            ("PASSWORD_ITERATIONS", "1"),
            ("PASSWORD_PARALLELISM", "1"),
            ("RATE_LIMIT_REQUESTS", "10000"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (key, value) in overrides {
            vars.insert(key.to_string(), value.to_string());
        }

        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
        let state = AppState::new(Arc::new(MemoryStore::new()), config.clone());

        TestContext {
            app: build_router(state),
            config,
        }
    }

    /// Sends a request and returns the raw response
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    /// Sends a request and decodes the JSON body (`Null` when empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.call(method, uri, token, body).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    /// Registers a user and panics unless it succeeds
    pub async fn register(&self, first: &str, last: &str, email: &str) -> TestUser {
        let (status, body) = self
            .post(
                "/api/v1/auth/register",
                None,
                json!({
                    "email": email,
                    "password": PASSWORD,
                    "firstName": first,
                    "lastName": last
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            email: body["user"]["email"].as_str().unwrap().to_string(),
            slug: body["user"]["portfolioSlug"].as_str().unwrap().to_string(),
            token: body["token"].as_str().unwrap().to_string(),
            refresh_token: body["refreshToken"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a project for `user` and returns its id
    pub async fn create_project(&self, user: &TestUser, title: &str, featured: bool) -> String {
        let (status, body) = self
            .post("/api/v1/projects", Some(&user.token), project_body(title, featured))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);
        body["project"]["id"].as_str().unwrap().to_string()
    }
}

/// A valid project payload
pub fn project_body(title: &str, featured: bool) -> Value {
    json!({
        "title": title,
        "shortDescription": "A short pitch",
        "description": "Built over a weekend with friends",
        "technologies": ["Rust", "Axum"],
        "category": "web",
        "status": "completed",
        "featured": featured,
        "hackathon": { "name": "HackMIT", "date": "2024-09-14", "location": "Cambridge, MA" }
    })
}

/// A valid achievement payload
pub fn achievement_body(title: &str, project_id: Option<&str>) -> Value {
    json!({
        "type": "award",
        "title": title,
        "issuer": "HackMIT",
        "date": "2024-09-15",
        "category": "hackathon",
        "level": "advanced",
        "featured": true,
        "projectId": project_id
    })
}
