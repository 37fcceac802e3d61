//! Durable store adapter.
//!
//! # Responsibility
//! - Turn a text key-value repository into typed, JSON-encoded cells.
//! - Keep every decode fallback decision in one place.

pub mod durable_store;
