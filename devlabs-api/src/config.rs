/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `PORT`: Port to bind to (default: 5000)
/// - `API_VERSION`: Path segment under `/api` (default: v1)
/// - `APP_ENV`: `production` enables HSTS (default: development)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `DATABASE_URL`: PostgreSQL connection string (optional, in-memory store when unset)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Access token signing key (required, at least 32 characters)
/// - `JWT_REFRESH_SECRET`: Refresh token signing key (required, at least 32 characters)
/// - `JWT_EXPIRE` / `JWT_REFRESH_EXPIRE`: Token lifetimes such as `7d` or `12h`
///   (default: 7d / 30d)
/// - `PASSWORD_MEMORY_KIB`, `PASSWORD_ITERATIONS`, `PASSWORD_PARALLELISM`:
///   Argon2id cost (default: 65536 / 3 / 4)
/// - `RATE_LIMIT_REQUESTS` / `RATE_LIMIT_WINDOW_SECS`: Requests allowed per
///   client per window (default: 100 per 900 seconds)
/// - `RUST_LOG`: Log filter; `LOG_FORMAT=json` switches to JSON logs
///
/// # Example
///
/// ```no_run
/// use devlabs_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use chrono::Duration;
use devlabs_shared::auth::jwt::{parse_duration, TokenConfig};
use devlabs_shared::auth::password::PasswordParams;
use devlabs_shared::db::pool::DatabaseConfig as PoolConfig;
use std::env;
use std::str::FromStr;

/// Minimum length of both JWT secrets
pub const MIN_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration; `None` selects the in-memory store
    pub database: Option<DatabaseConfig>,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Argon2id cost parameters
    pub password: PasswordParams,

    /// Per-client request budget
    pub rate_limit: RateLimitConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Version segment of the route prefix, e.g. `v1` in `/api/v1`
    pub version: String,

    /// Allowed CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,

    /// Production mode (enables HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for access tokens
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Secret key for refresh tokens, distinct from `secret`
    pub refresh_secret: String,

    /// Access token lifetime
    pub expire: Duration,

    /// Refresh token lifetime
    pub refresh_expire: Duration,
}

/// Token bucket sizing for the rate limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests a client may make per window (bucket capacity)
    pub requests: u32,

    /// Window length in seconds; the bucket refills fully over one window
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: 100,
            window_secs: 900,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    ///
    /// `from_env` uses the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&var, "PORT", 5000u16)?;
        let version = var("API_VERSION").unwrap_or_else(|| "v1".to_string());
        let production = var("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("production"));
        let cors_origins = var("CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["*".to_string()]);

        let database = match var("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_or(&var, "DATABASE_MAX_CONNECTIONS", 10u32)?,
            }),
            None => None,
        };

        let secret = required_secret(&var, "JWT_SECRET")?;
        let refresh_secret = required_secret(&var, "JWT_REFRESH_SECRET")?;
        let expire = duration_or(&var, "JWT_EXPIRE", Duration::days(7))?;
        let refresh_expire = duration_or(&var, "JWT_REFRESH_EXPIRE", Duration::days(30))?;

        let defaults = PasswordParams::default();
        let password = PasswordParams {
            memory_kib: parse_or(&var, "PASSWORD_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&var, "PASSWORD_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&var, "PASSWORD_PARALLELISM", defaults.parallelism)?,
        };

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            requests: parse_or(&var, "RATE_LIMIT_REQUESTS", defaults.requests)?,
            window_secs: parse_or(&var, "RATE_LIMIT_WINDOW_SECS", defaults.window_secs)?,
        };
        if rate_limit.requests == 0 || rate_limit.window_secs == 0 {
            anyhow::bail!("RATE_LIMIT_REQUESTS and RATE_LIMIT_WINDOW_SECS must be positive");
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                version,
                cors_origins,
                production,
            },
            database,
            jwt: JwtConfig {
                secret,
                refresh_secret,
                expire,
                refresh_expire,
            },
            password,
            rate_limit,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Route prefix of the versioned API, e.g. `/api/v1`
    pub fn api_prefix(&self) -> String {
        format!("/api/{}", self.api.version)
    }

    /// Secrets and lifetimes for issuing tokens
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            access_secret: self.jwt.secret.clone(),
            refresh_secret: self.jwt.refresh_secret.clone(),
            access_ttl: self.jwt.expire,
            refresh_ttl: self.jwt.refresh_expire,
        }
    }

    /// Pool settings for the PostgreSQL backend, if one is configured
    pub fn pool_config(&self) -> Option<PoolConfig> {
        self.database.as_ref().map(|db| PoolConfig {
            url: db.url.clone(),
            max_connections: db.max_connections,
            ..Default::default()
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {value}")),
        None => Ok(default),
    }
}

fn duration_or<F>(var: &F, key: &str, default: Duration) -> anyhow::Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => parse_duration(&value)
            .ok_or_else(|| anyhow::anyhow!("{key} must look like 7d, 12h, 30m, 45s or 3600")),
        None => Ok(default),
    }
}

fn required_secret<F>(var: &F, key: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let secret = var(key).ok_or_else(|| anyhow::anyhow!("{key} environment variable is required"))?;

    if secret.len() < MIN_SECRET_LENGTH {
        anyhow::bail!("{key} must be at least {MIN_SECRET_LENGTH} characters long");
    }

    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const SECRETS: [(&str, &str); 2] = [
        ("JWT_SECRET", "test-access-secret-at-least-32-bytes"),
        ("JWT_REFRESH_SECRET", "test-refresh-secret-at-least-32-bytes"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&SECRETS).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.api_prefix(), "/api/v1");
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert!(!config.api.production);
        assert!(config.database.is_none());
        assert!(config.pool_config().is_none());
        assert_eq!(config.jwt.expire, Duration::days(7));
        assert_eq!(config.jwt.refresh_expire, Duration::days(30));
        assert_eq!(config.password, PasswordParams::default());
        assert_eq!(config.rate_limit, RateLimitConfig::default());
    }

    #[test]
    fn test_overrides() {
        let mut pairs = SECRETS.to_vec();
        pairs.extend([
            ("API_HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("API_VERSION", "v2"),
            ("APP_ENV", "production"),
            ("CORS_ORIGINS", "https://a.dev, https://b.dev"),
            ("DATABASE_URL", "postgresql://localhost/devlabs"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("JWT_EXPIRE", "12h"),
            ("RATE_LIMIT_REQUESTS", "5"),
        ]);
        let config = load(&pairs).unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.api_prefix(), "/api/v2");
        assert!(config.api.production);
        assert_eq!(config.api.cors_origins, vec!["https://a.dev", "https://b.dev"]);
        assert_eq!(config.token_config().access_ttl, Duration::hours(12));
        assert_eq!(config.rate_limit.requests, 5);

        let pool = config.pool_config().unwrap();
        assert_eq!(pool.url, "postgresql://localhost/devlabs");
        assert_eq!(pool.max_connections, 4);
    }

    #[test]
    fn test_secrets_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        let err = load(&[SECRETS[0], ("JWT_REFRESH_SECRET", "short")]).unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_invalid_values() {
        let mut pairs = SECRETS.to_vec();
        pairs.push(("PORT", "not-a-port"));
        assert!(load(&pairs).is_err());

        let mut pairs = SECRETS.to_vec();
        pairs.push(("JWT_EXPIRE", "soon"));
        assert!(load(&pairs).is_err());

        let mut pairs = SECRETS.to_vec();
        pairs.push(("RATE_LIMIT_WINDOW_SECS", "0"));
        assert!(load(&pairs).is_err());
    }
}
