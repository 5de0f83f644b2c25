/// Request extractors with API-shaped rejections
///
/// Axum's stock extractors reject malformed input with plain-text bodies and
/// a mix of 400/415/422 statuses. These wrappers run the same extraction but
/// reject with [`ApiError::BadRequest`] (or `PayloadTooLarge` for an
/// oversized body), so every client error shares the JSON error format.
///
/// Handlers still call `validate()` on the extracted body:
///
/// ```ignore
/// pub async fn create(JsonBody(req): JsonBody<ProjectData>) -> ApiResult<...> {
///     req.validate()?;
///     ...
/// }
/// ```

use crate::error::ApiError;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
};

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// Query string parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge(rejection.body_text());
        }
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected path parameter");
        ApiError::BadRequest("Invalid id".to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        extract::DefaultBodyLimit,
        routing::{get, post},
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Deserialize)]
    struct Named {
        #[allow(dead_code)]
        name: String,
    }

    #[derive(Deserialize)]
    struct Paging {
        page: Option<u32>,
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/small",
                post(|JsonBody(_): JsonBody<Named>| async { "ok" }),
            )
            .layer(DefaultBodyLimit::max(16))
            .route("/json", post(|JsonBody(_): JsonBody<Named>| async { "ok" }))
            .route("/items/:id", get(|PathParam(id): PathParam<Uuid>| async move { id.to_string() }))
            .route(
                "/query",
                get(|QueryParams(q): QueryParams<Paging>| async move { q.page.unwrap_or(1).to_string() }),
            )
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn test_json_rejections_are_bad_requests() {
        let missing_field = Request::post("/json")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = send(missing_field).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");

        let no_content_type = Request::post("/json").body(Body::from("{}")).unwrap();
        let (status, _) = send(no_content_type).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_body_keeps_413() {
        let oversized = Request::post("/small")
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"name":"{}"}}"#, "x".repeat(64))))
            .unwrap();
        let (status, body) = send(oversized).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "payload_too_large");
    }

    #[tokio::test]
    async fn test_path_and_query_rejections() {
        let (status, body) = send(Request::get("/items/nope").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid id");

        let (status, _) = send(Request::get("/query?page=abc").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
