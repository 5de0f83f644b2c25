/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Access and refresh token issuing and validation
/// - [`middleware`]: Bearer token extraction and the request auth context
///
/// # Example
///
/// ```
/// use devlabs_shared::auth::jwt::{validate_access_token, TokenConfig};
/// use devlabs_shared::auth::password::{hash_password, verify_password, PasswordParams};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let params = PasswordParams { memory_kib: 1024, iterations: 1, parallelism: 1 };
/// let hash = hash_password("user_password", &params)?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let tokens = TokenConfig::new(
///     "access-secret-at-least-32-bytes-long!!",
///     "refresh-secret-at-least-32-bytes-long!",
/// );
/// let pair = tokens.issue_pair(Uuid::new_v4(), "ada@example.com")?;
/// validate_access_token(&pair.token, &tokens.access_secret)?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
