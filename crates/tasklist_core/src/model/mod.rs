//! Task list domain model.
//!
//! # Responsibility
//! - Define the task record and its persisted wire shape.
//! - Provide pure transformations over single tasks and collections.
//!
//! # Invariants
//! - Ids are unique within one collection.
//! - Collections keep insertion order; nothing re-sorts them.

pub mod task;
pub mod timestamp;
