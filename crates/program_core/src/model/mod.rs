//! Domain model for program records.
//!
//! # Responsibility
//! - Define canonical data structures used by program business logic.
//! - Host pure rule checks shared by the service layer.
//!
//! # Invariants
//! - Every persisted program is identified by a store-assigned `ProgramId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod program;
