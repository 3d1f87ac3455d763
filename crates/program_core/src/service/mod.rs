//! Core use-case services.
//!
//! # Responsibility
//! - Hold business rules and orchestrate repository calls.
//! - Keep callers (CLI, future HTTP layer) decoupled from storage details.

pub mod program_service;
