//! Program use-case service.
//!
//! # Responsibility
//! - Enforce program business rules before any write reaches storage.
//! - Provide search/filter/statistics read models over the repository.
//!
//! # Invariants
//! - Rules run in a fixed order and the first violation aborts the call.
//! - Nothing is written when validation fails.
//! - The service holds no state besides its repository and rule settings.

use crate::model::program::{
    name_key, normalize_name, Program, ProgramChanges, ProgramDraft, ProgramId, ProgramRules,
    ValidationError,
};
use crate::repo::program_repo::{ProgramQuery, ProgramRepository, RepoError};
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MIN_SEARCH_CHARS: usize = 2;

pub type ServiceResult<T> = Result<T, ProgramServiceError>;

/// Service error for program use-cases.
#[derive(Debug)]
pub enum ProgramServiceError {
    /// A business rule rejected the input.
    Validation(ValidationError),
    /// Target program does not exist.
    NotFound(ProgramId),
    /// Persistence-layer failure, passed through unchanged.
    Repo(RepoError),
}

impl ProgramServiceError {
    /// Returns the violated rule when this is a validation failure.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for ProgramServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "program with id {id} not found"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProgramServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<ValidationError> for ProgramServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ProgramServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::DuplicateName(name) => {
                Self::Validation(ValidationError::duplicate_name(&name))
            }
            other => Self::Repo(other),
        }
    }
}

/// Aggregate figures over every stored program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramStatistics {
    pub total_programs: usize,
    pub active_programs: usize,
    /// `0.0` when there are no programs.
    pub average_duration_months: f64,
    pub min_duration_months: Option<i32>,
    pub max_duration_months: Option<i32>,
}

impl ProgramStatistics {
    /// Statistics of an empty store.
    pub fn empty() -> Self {
        Self {
            total_programs: 0,
            active_programs: 0,
            average_duration_months: 0.0,
            min_duration_months: None,
            max_duration_months: None,
        }
    }

    fn from_programs(programs: &[Program]) -> Self {
        if programs.is_empty() {
            return Self::empty();
        }

        let total_months: i64 = programs
            .iter()
            .map(|program| i64::from(program.duration_months))
            .sum();

        Self {
            total_programs: programs.len(),
            active_programs: programs.iter().filter(|program| program.active).count(),
            average_duration_months: total_months as f64 / programs.len() as f64,
            min_duration_months: programs.iter().map(|program| program.duration_months).min(),
            max_duration_months: programs.iter().map(|program| program.duration_months).max(),
        }
    }
}

/// Business rule service for programs.
pub struct ProgramService<R: ProgramRepository> {
    repo: R,
    rules: ProgramRules,
}

impl<R: ProgramRepository> ProgramService<R> {
    /// Creates a service with default rules over the given repository.
    pub fn new(repo: R) -> Self {
        Self::with_rules(repo, ProgramRules::default())
    }

    pub fn with_rules(repo: R, rules: ProgramRules) -> Self {
        Self { repo, rules }
    }

    pub fn rules(&self) -> &ProgramRules {
        &self.rules
    }

    /// Validates and stores a new program.
    ///
    /// # Contract
    /// - The name is normalized before any rule runs and is stored normalized.
    /// - Check order: name length, name uniqueness, date order, duration
    ///   positivity, duration/date-span agreement.
    /// - Returns the stored record with its assigned id.
    pub fn create_program(&self, draft: &ProgramDraft) -> ServiceResult<Program> {
        let mut candidate = draft.clone();
        candidate.name = normalize_name(&draft.name);

        if let Err(err) = self.validate(
            &candidate.name,
            None,
            candidate.start_date,
            candidate.end_date,
            candidate.duration_months,
        ) {
            warn!(
                "event=program_create module=service status=rejected rule={}",
                rule_code(&err)
            );
            return Err(err);
        }

        let program = self.repo.create(&candidate)?;
        info!(
            "event=program_create module=service status=ok id={}",
            program.id
        );
        Ok(program)
    }

    /// Validates the merged state and applies `changes` to program `id`.
    ///
    /// Fields left as `None` keep their stored value. The uniqueness check is
    /// skipped when the resulting name equals the program's own current name
    /// ignoring case.
    pub fn update_program(
        &self,
        id: ProgramId,
        changes: &ProgramChanges,
    ) -> ServiceResult<Program> {
        let current = self
            .repo
            .get_by_id(id)?
            .ok_or(ProgramServiceError::NotFound(id))?;

        let mut normalized = changes.clone();
        if let Some(name) = &changes.name {
            normalized.name = Some(normalize_name(name));
        }
        let candidate = normalized.apply_to(&current);

        if let Err(err) = self.validate(
            &candidate.name,
            Some(&current.name),
            candidate.start_date,
            candidate.end_date,
            candidate.duration_months,
        ) {
            warn!(
                "event=program_update module=service status=rejected id={id} rule={}",
                rule_code(&err)
            );
            return Err(err);
        }

        let program = self.repo.update(id, &normalized)?;
        info!("event=program_update module=service status=ok id={id}");
        Ok(program)
    }

    /// Deletes program `id`, reporting `NotFound` when it does not exist.
    pub fn delete_program(&self, id: ProgramId) -> ServiceResult<()> {
        if !self.repo.delete(id)? {
            warn!("event=program_delete module=service status=not_found id={id}");
            return Err(ProgramServiceError::NotFound(id));
        }

        info!("event=program_delete module=service status=ok id={id}");
        Ok(())
    }

    pub fn get_program(&self, id: ProgramId) -> ServiceResult<Program> {
        self.repo
            .get_by_id(id)?
            .ok_or(ProgramServiceError::NotFound(id))
    }

    /// Lists every program in insertion order.
    pub fn list_programs(&self) -> ServiceResult<Vec<Program>> {
        Ok(self.repo.get_all()?)
    }

    /// Case-insensitive substring search on program names.
    ///
    /// Queries shorter than two characters after trimming return no results.
    pub fn search_programs(&self, query: &str) -> ServiceResult<Vec<Program>> {
        let fragment = normalize_name(query);
        if fragment.chars().count() < MIN_SEARCH_CHARS {
            debug!("event=program_search module=service status=skipped reason=short_query");
            return Ok(Vec::new());
        }

        let programs = self.repo.search(&ProgramQuery::name_contains(fragment))?;
        debug!(
            "event=program_search module=service status=ok results={}",
            programs.len()
        );
        Ok(programs)
    }

    /// Programs whose duration lies in `[min_months, max_months]`.
    ///
    /// An inverted range matches nothing.
    pub fn filter_by_duration(
        &self,
        min_months: i32,
        max_months: i32,
    ) -> ServiceResult<Vec<Program>> {
        if min_months > max_months {
            return Ok(Vec::new());
        }
        Ok(self
            .repo
            .search(&ProgramQuery::duration_between(min_months, max_months))?)
    }

    /// Aggregates over all programs; an empty store yields `ProgramStatistics::empty()`.
    pub fn compute_statistics(&self) -> ServiceResult<ProgramStatistics> {
        let programs = self.repo.get_all()?;
        Ok(ProgramStatistics::from_programs(&programs))
    }

    fn validate(
        &self,
        name: &str,
        current_name: Option<&str>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        duration_months: i32,
    ) -> ServiceResult<()> {
        self.rules.check_name_length(name)?;

        let keeps_own_name =
            current_name.is_some_and(|current| name_key(current) == name_key(name));
        if !keeps_own_name && self.repo.exists_by_name(name)? {
            return Err(ValidationError::duplicate_name(name).into());
        }

        self.rules.check_date_range(start_date, end_date)?;
        self.rules.check_duration_positive(duration_months)?;
        self.rules
            .check_duration_span(start_date, end_date, duration_months)?;
        Ok(())
    }
}

fn rule_code(err: &ProgramServiceError) -> &'static str {
    match err {
        ProgramServiceError::Validation(err) => err.rule.code(),
        ProgramServiceError::NotFound(_) => "not_found",
        ProgramServiceError::Repo(_) => "storage",
    }
}
