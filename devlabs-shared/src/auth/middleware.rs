/// Request authentication helpers for Axum
///
/// The API's middleware layers call [`authenticate`] on the request headers
/// and insert the resulting [`AuthContext`] into the request extensions.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use devlabs_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}", auth.email)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, Claims, JwtError};

/// Identity of the authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

/// Why a request could not be authenticated
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Access denied. No token provided.")]
    MissingCredentials,

    #[error("Expected Bearer token")]
    InvalidFormat,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            _ => AuthError::InvalidToken,
        }
    }
}

/// Extracts the bearer token from the `Authorization` header, if any
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AuthError::InvalidFormat)?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or(AuthError::InvalidFormat)
}

/// Authenticates a request from its headers
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?.ok_or(AuthError::MissingCredentials)?;
    let claims = validate_access_token(token, secret)?;
    Ok(AuthContext::from(claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenConfig;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-access-secret-at-least-32-bytes";

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_authenticate_valid_token() {
        let tokens = TokenConfig::new(SECRET, "test-refresh-secret-at-least-32-bytes");
        let user_id = Uuid::new_v4();
        let token = tokens.issue_access(user_id, "ada@example.com").unwrap();

        let auth = authenticate(&headers(&format!("Bearer {token}")), SECRET).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.email, "ada@example.com");
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            authenticate(&HeaderMap::new(), SECRET),
            Err(AuthError::MissingCredentials)
        ));
        assert!(bearer_token(&HeaderMap::new()).unwrap().is_none());
    }

    #[test]
    fn test_wrong_scheme() {
        assert!(matches!(
            authenticate(&headers("Basic abc"), SECRET),
            Err(AuthError::InvalidFormat)
        ));
        assert!(matches!(
            bearer_token(&headers("Bearer ")),
            Err(AuthError::InvalidFormat)
        ));
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(
            authenticate(&headers("Bearer not.a.jwt"), SECRET),
            Err(AuthError::InvalidToken)
        ));
    }
}
