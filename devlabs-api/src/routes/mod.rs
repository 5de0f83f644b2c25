/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, token verification and refresh
/// - `users`: Profile, password, settings and account management
/// - `projects`: Project CRUD and listing
/// - `achievements`: Achievement CRUD and listing
/// - `portfolio`: Portfolio data, publishing settings, export, preview, public page
/// - `analytics`: Dashboard statistics

pub mod achievements;
pub mod analytics;
pub mod auth;
pub mod health;
pub mod portfolio;
pub mod projects;
pub mod users;

use crate::error::ApiError;
use serde::{Deserialize, Serialize};

/// Body of responses that only carry a confirmation
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
