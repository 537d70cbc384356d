//! Library tests
//!
//! - Shared fixtures: fake player, fake transcript source, recording view
//! - Extraction pipeline against a mock upstream
//! - Active-cue lookup properties
