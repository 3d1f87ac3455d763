//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage port consumed by `ProgramService`.
//! - Isolate SQLite query details from business orchestration.
//!
//! # Invariants
//! - Repositories store what they are given; rules are enforced upstream.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateName`) in
//!   addition to DB transport errors.

pub mod memory_repo;
pub mod program_repo;
