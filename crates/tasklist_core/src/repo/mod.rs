//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the key-value storage contract used by the durable store.
//! - Isolate SQLite query details from store/service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`QuotaExceeded`,
//!   `MissingRequiredTable`) in addition to DB transport errors.

pub mod kv_repo;
