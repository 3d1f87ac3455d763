//! Core business rules and storage port for program records.
//! This crate is the single source of truth for program invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::program::{
    month_span, name_key, normalize_name, Program, ProgramChanges, ProgramDraft, ProgramId, ProgramRules,
    ValidationError, ValidationRule,
};
pub use repo::memory_repo::InMemoryProgramRepository;
pub use repo::program_repo::{
    ProgramQuery, ProgramRepository, RepoError, RepoResult, SqliteProgramRepository,
};
pub use service::program_service::{
    ProgramService, ProgramServiceError, ProgramStatistics, ServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
