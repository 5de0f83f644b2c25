//! # DevLabs API Server Library
//!
//! REST API behind the DevLabs hackathon portfolio: accounts, projects,
//! achievements, portfolio publishing and dashboard analytics.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder and auth layers
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors that reject with API errors
//! - `middleware`: Security headers and rate limiting
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
