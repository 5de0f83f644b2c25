/// JWT token generation and validation
///
/// Tokens are signed with HS256. Access and refresh tokens use separate
/// secrets, so a leaked access secret cannot mint refresh tokens.
///
/// # Token Types
///
/// - **Access Token**: authenticates API calls, 7 days by default
/// - **Refresh Token**: exchanged for a new access token, 30 days by default
///
/// # Example
///
/// ```
/// use devlabs_shared::auth::jwt::{TokenConfig, validate_access_token};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenConfig::new(
///     "access-secret-at-least-32-bytes-long!!",
///     "refresh-secret-at-least-32-bytes-long!",
/// );
/// let user_id = Uuid::new_v4();
///
/// let pair = tokens.issue_pair(user_id, "ada@example.com")?;
/// let claims = validate_access_token(&pair.token, &tokens.access_secret)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim of every token
pub const ISSUER: &str = "devlabs";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token of the wrong type (access vs refresh)
    #[error("Expected {expected} token")]
    WrongType { expected: &'static str },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Email of the user at issue time
    pub email: String,

    /// Issuer - Always [`ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    pub token_type: TokenType,
}

impl Claims {
    /// Claims valid from now for `expires_in`
    pub fn new(
        user_id: Uuid,
        email: impl Into<String>,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            email: email.into(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            token_type,
        }
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Checks signature, expiry, not-before and issuer, and returns the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

fn validate_typed(token: &str, secret: &str, expected: TokenType) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != expected {
        return Err(JwtError::WrongType {
            expected: expected.as_str(),
        });
    }

    Ok(claims)
}

/// Validates a token and requires it to be an access token
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Access)
}

/// Validates a token and requires it to be a refresh token
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Refresh)
}

/// Exchanges a refresh token for a new access token
///
/// The refresh token is checked against `tokens.refresh_secret`; the new
/// access token is signed with `tokens.access_secret`. Returns the user the
/// tokens belong to alongside the new access token.
pub fn refresh_access_token(
    refresh_token: &str,
    tokens: &TokenConfig,
) -> Result<(Uuid, String), JwtError> {
    let refresh_claims = validate_refresh_token(refresh_token, &tokens.refresh_secret)?;
    let token = tokens.issue_access(refresh_claims.sub, &refresh_claims.email)?;
    Ok((refresh_claims.sub, token))
}

/// Access and refresh token issued together at login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// Secrets and lifetimes for issuing tokens
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Default lifetimes: 7 days for access, 30 days for refresh tokens
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::days(7),
            refresh_ttl: Duration::days(30),
        }
    }

    pub fn issue_access(&self, user_id: Uuid, email: &str) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, email, TokenType::Access, self.access_ttl);
        create_token(&claims, &self.access_secret)
    }

    pub fn issue_refresh(&self, user_id: Uuid, email: &str) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, email, TokenType::Refresh, self.refresh_ttl);
        create_token(&claims, &self.refresh_secret)
    }

    pub fn issue_pair(&self, user_id: Uuid, email: &str) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            token: self.issue_access(user_id, email)?,
            refresh_token: self.issue_refresh(user_id, email)?,
        })
    }
}

/// Parses a token lifetime such as `"7d"`, `"12h"`, `"30m"`, `"45s"` or `"3600"`
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (digits, unit) = match value.char_indices().last()? {
        (i, c) if c.is_ascii_alphabetic() => (&value[..i], c.to_ascii_lowercase()),
        _ => (value, 's'),
    };
    let amount: i64 = digits.trim().parse().ok().filter(|n| *n > 0)?;

    match unit {
        's' => Some(Duration::seconds(amount)),
        'm' => Some(Duration::minutes(amount)),
        'h' => Some(Duration::hours(amount)),
        'd' => Some(Duration::days(amount)),
        _ => None,
    }
}
