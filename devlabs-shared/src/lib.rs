//! # DevLabs Shared Library
//!
//! This crate contains the domain types, persistence layer, and business logic
//! behind the DevLabs portfolio API.
//!
//! ## Module Organization
//!
//! - `models`: Users, projects, achievements and portfolio views
//! - `store`: Persistence traits with PostgreSQL and in-memory backends
//! - `db`: PostgreSQL pool and migrations
//! - `auth`: Password hashing, JWT tokens, request auth context
//! - `slug`: Unique portfolio slug resolution
//! - `pagination`: Offset/limit paging
//! - `analytics`: Dashboard statistics
//! - `validation`: Field validators shared by request schemas

pub mod analytics;
pub mod auth;
pub mod db;
pub mod models;
pub mod pagination;
pub mod slug;
pub mod store;
pub mod validation;

/// Current version of the DevLabs shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
