//! Integration testing module
//!
//! End-to-end tests for the transcript server:
//! - Router-level requests against a mock video platform
//! - Error payload mapping and in-flight sharing
//! - The library client and viewing session over a live socket

pub mod client_session;
pub mod e2e;
pub mod fixtures;
