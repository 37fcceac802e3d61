//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into use-case level APIs.
//! - Keep CLI/UI layers decoupled from storage details.

pub mod task_list_service;
