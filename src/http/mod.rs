//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with the transcript, health, version and metrics endpoints
//! - Error-to-response mapping for the transcript API
//! - Request logging middleware
//! - Static file fallback and CORS

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
