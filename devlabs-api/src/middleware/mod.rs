/// Middleware modules for the API server
///
/// - `security`: Security response headers
/// - `rate_limit`: Per-client token bucket rate limiting
///
/// Authentication layers live in [`crate::app`] next to the router.

pub mod rate_limit;
pub mod security;
