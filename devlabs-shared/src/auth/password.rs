/// Password hashing with Argon2id
///
/// Hashes are stored as PHC strings, which embed the algorithm, parameters
/// and salt, so verification works even after the configured parameters
/// change.
///
/// # Example
///
/// ```
/// use devlabs_shared::auth::password::{hash_password, verify_password, PasswordParams};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let params = PasswordParams { memory_kib: 1024, iterations: 1, parallelism: 1 };
/// let hash = hash_password("hunter22", &params)?;
///
/// assert!(verify_password("hunter22", &hash)?);
/// assert!(!verify_password("hunter23", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, ParamsBuilder, Version,
};
use tracing::warn;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: u64 = 6;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordParams {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl PasswordParams {
    fn hasher(&self) -> Result<Argon2<'static>, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(self.memory_kib)
            .t_cost(self.iterations)
            .p_cost(self.parallelism)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hashes a password with a fresh random salt
///
/// Returns a PHC string such as `$argon2id$v=19$m=65536,t=3,p=4$...`.
pub fn hash_password(password: &str, params: &PasswordParams) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = params
        .hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored PHC hash
///
/// `Ok(false)` means the password is wrong; errors mean the hash itself is
/// unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;
    if parsed_hash.salt.is_none() || parsed_hash.hash.is_none() {
        return Err(PasswordError::InvalidHash(
            "Hash is missing its salt or output".to_string(),
        ));
    }

    // Parameters come from the hash itself
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Spends the same work as a real verification, for logins with no account
///
/// Hashing with the configured parameters costs the same as verifying against
/// a hash made with them, so an unknown email takes as long to reject as a
/// wrong password.
pub fn dummy_verify(password: &str, params: &PasswordParams) {
    if let Err(e) = hash_password(password, params) {
        warn!(error = %e, "Dummy password hash failed");
    }
}

/// Verifies against `hash` if there is one, otherwise burns a dummy hash
///
/// Returns `Ok(false)` when there is no hash.
pub fn verify_or_dummy(
    password: &str,
    hash: Option<&str>,
    params: &PasswordParams,
) -> Result<bool, PasswordError> {
    match hash {
        Some(hash) => verify_password(password, hash),
        None => {
            dummy_verify(password, params);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cheap parameters so the suite stays fast
    const FAST: PasswordParams = PasswordParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    };

    #[test]
    fn test_default_params() {
        let params = PasswordParams::default();
        assert_eq!(params.memory_kib, 65536);
        assert_eq!(params.iterations, 3);
        assert_eq!(params.parallelism, 4);
    }

    #[test]
    fn test_hash_embeds_params() {
        let hash = hash_password("test_password_123", &FAST).expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=1024"));
        assert!(hash.contains("t=1"));
        assert!(hash.contains("p=1"));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = hash_password("same_password", &FAST).expect("Hash 1 should succeed");
        let hash2 = hash_password("same_password", &FAST).expect("Hash 2 should succeed");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct_password", &FAST).expect("Hash should succeed");

        assert!(verify_password("correct_password", &hash).expect("Verify should succeed"));
        assert!(!verify_password("wrong_password", &hash).expect("Verify should succeed"));
        assert!(!verify_password("", &hash).expect("Verify should succeed"));
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "invalid_hash").is_err());
        assert!(verify_password("password", "$argon2id$invalid").is_err());
        assert!(verify_password("password", "$argon2id$v=19$m=1024,t=1,p=1").is_err());
    }

    #[test]
    fn test_unicode_roundtrip() {
        let hash = hash_password("unicode-密码-パスワード", &FAST).expect("Hash should succeed");
        assert!(verify_password("unicode-密码-パスワード", &hash).expect("Verify should succeed"));
    }

    #[test]
    fn test_verify_or_dummy() {
        let hash = hash_password("secret1", &FAST).expect("Hash should succeed");

        assert!(verify_or_dummy("secret1", Some(&hash), &FAST).unwrap());
        assert!(!verify_or_dummy("secret2", Some(&hash), &FAST).unwrap());
        assert!(!verify_or_dummy("secret1", None, &FAST).unwrap());
    }

    #[test]
    fn test_invalid_params_are_reported() {
        let params = PasswordParams {
            memory_kib: 1,
            iterations: 0,
            parallelism: 0,
        };
        assert!(matches!(
            hash_password("x", &params),
            Err(PasswordError::HashError(_))
        ));
    }
}
