//! Program domain model and business rule primitives.
//!
//! # Responsibility
//! - Define the canonical `Program` record and its create/update inputs.
//! - Provide pure rule checks that do not need storage access.
//!
//! # Invariants
//! - `id` is assigned by the store and never changes afterwards.
//! - `duration_months` is always expressed in whole calendar months.
//! - Names are stored in normalized form and compared through `name_key`.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Store-assigned identifier for a program record.
pub type ProgramId = i64;

/// Persisted program record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Assigned by the store on creation.
    pub id: ProgramId,
    pub name: String,
    pub description: String,
    pub national_alignment: String,
    pub focus_areas: String,
    pub phases: String,
    pub start_date: NaiveDate,
    /// Strictly after `start_date`.
    pub end_date: NaiveDate,
    pub duration_months: i32,
    pub active: bool,
}

impl Program {
    /// Returns the calendar month span covered by this record's dates.
    pub fn month_span(&self) -> i32 {
        month_span(self.start_date, self.end_date)
    }
}

/// Full field set used to create a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub national_alignment: String,
    #[serde(default)]
    pub focus_areas: String,
    #[serde(default)]
    pub phases: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_months: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl ProgramDraft {
    /// Creates an active draft with empty free-text fields.
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        duration_months: i32,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            national_alignment: String::new(),
            focus_areas: String::new(),
            phases: String::new(),
            start_date,
            end_date,
            duration_months,
            active: true,
        }
    }

    /// Binds this draft to a store-assigned id.
    pub fn into_program(self, id: ProgramId) -> Program {
        Program {
            id,
            name: self.name,
            description: self.description,
            national_alignment: self.national_alignment,
            focus_areas: self.focus_areas,
            phases: self.phases,
            start_date: self.start_date,
            end_date: self.end_date,
            duration_months: self.duration_months,
            active: self.active,
        }
    }
}

/// Partial update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgramChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub national_alignment: Option<String>,
    pub focus_areas: Option<String>,
    pub phases: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub duration_months: Option<i32>,
    pub active: Option<bool>,
}

impl ProgramChanges {
    /// Returns `true` when no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Builds the merged record these changes would produce on `current`.
    pub fn apply_to(&self, current: &Program) -> Program {
        Program {
            id: current.id,
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            national_alignment: self
                .national_alignment
                .clone()
                .unwrap_or_else(|| current.national_alignment.clone()),
            focus_areas: self
                .focus_areas
                .clone()
                .unwrap_or_else(|| current.focus_areas.clone()),
            phases: self.phases.clone().unwrap_or_else(|| current.phases.clone()),
            start_date: self.start_date.unwrap_or(current.start_date),
            end_date: self.end_date.unwrap_or(current.end_date),
            duration_months: self.duration_months.unwrap_or(current.duration_months),
            active: self.active.unwrap_or(current.active),
        }
    }
}

fn default_active() -> bool {
    true
}

/// Business rule that rejected a create/update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRule {
    NameTooShort,
    DuplicateName,
    InvalidDateRange,
    NonPositiveDuration,
    DurationDateMismatch,
}

impl ValidationRule {
    /// Stable machine-readable code, used in logs and CLI output.
    pub fn code(self) -> &'static str {
        match self {
            Self::NameTooShort => "name_too_short",
            Self::DuplicateName => "duplicate_name",
            Self::InvalidDateRange => "invalid_date_range",
            Self::NonPositiveDuration => "non_positive_duration",
            Self::DurationDateMismatch => "duration_date_mismatch",
        }
    }
}

/// Rule violation with the offending value and a human-readable reason.
///
/// Callers branch on `rule`; `message` is meant to be shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub rule: ValidationRule,
    pub value: String,
    pub message: String,
}

impl ValidationError {
    fn new(rule: ValidationRule, value: impl Into<String>, message: String) -> Self {
        Self {
            rule,
            value: value.into(),
            message,
        }
    }

    pub fn duplicate_name(name: &str) -> Self {
        Self::new(
            ValidationRule::DuplicateName,
            name,
            format!("program with name `{name}` already exists"),
        )
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ValidationError {}

/// Tunable thresholds for program validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramRules {
    /// Minimum name length in characters, counted after normalization.
    pub min_name_chars: usize,
    /// Allowed distance between `duration_months` and the date span.
    pub duration_tolerance_months: u32,
}

impl Default for ProgramRules {
    fn default() -> Self {
        Self {
            min_name_chars: 3,
            duration_tolerance_months: 1,
        }
    }
}

impl ProgramRules {
    pub fn check_name_length(&self, name: &str) -> Result<(), ValidationError> {
        let chars = name.chars().count();
        if chars < self.min_name_chars {
            return Err(ValidationError::new(
                ValidationRule::NameTooShort,
                name,
                format!(
                    "program name must be at least {} characters, got `{name}` ({chars})",
                    self.min_name_chars
                ),
            ));
        }
        Ok(())
    }

    pub fn check_date_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<(), ValidationError> {
        if end_date <= start_date {
            return Err(ValidationError::new(
                ValidationRule::InvalidDateRange,
                format!("{start_date}..{end_date}"),
                format!("end date {end_date} must be after start date {start_date}"),
            ));
        }
        Ok(())
    }

    pub fn check_duration_positive(&self, duration_months: i32) -> Result<(), ValidationError> {
        if duration_months <= 0 {
            return Err(ValidationError::new(
                ValidationRule::NonPositiveDuration,
                duration_months.to_string(),
                format!("duration must be greater than 0 months, got {duration_months}"),
            ));
        }
        Ok(())
    }

    /// Expects `check_date_range` to have passed already.
    pub fn check_duration_span(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        duration_months: i32,
    ) -> Result<(), ValidationError> {
        let span = month_span(start_date, end_date);
        if (duration_months - span).unsigned_abs() > self.duration_tolerance_months {
            return Err(ValidationError::new(
                ValidationRule::DurationDateMismatch,
                duration_months.to_string(),
                format!(
                    "duration of {duration_months} months does not match the {span}-month span \
                     from {start_date} to {end_date} (tolerance ±{})",
                    self.duration_tolerance_months
                ),
            ));
        }
        Ok(())
    }
}

/// Trims a program name and collapses inner whitespace runs to one space.
pub fn normalize_name(name: &str) -> String {
    WHITESPACE_RE.replace_all(name.trim(), " ").into_owned()
}

/// Case-folded comparison key for a name: normalized, then Unicode-lowercased.
///
/// Every store compares names through this key, so uniqueness and name search
/// agree across storage backends.
pub fn name_key(name: &str) -> String {
    normalize_name(name).to_lowercase()
}

/// Calendar month difference between two dates; the day of month is ignored.
pub fn month_span(start_date: NaiveDate, end_date: NaiveDate) -> i32 {
    let years = end_date.year() - start_date.year();
    let months = end_date.month() as i32 - start_date.month() as i32;
    years * 12 + months
}

#[cfg(test)]
mod tests {
    use super::{month_span, name_key, normalize_name, ProgramRules, ValidationRule};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn normalize_name_trims_and_collapses_whitespace() {
        assert_eq!(normalize_name("  Data \t  Lab \n"), "Data Lab");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn name_key_folds_case_beyond_ascii() {
        assert_eq!(name_key("  Éducation   LAB "), "éducation lab");
        assert_eq!(name_key("ÅNGSTRÖM Studio"), name_key("ångström studio"));
        assert_ne!(name_key("Data Lab"), name_key("Data Labs"));
    }

    #[test]
    fn month_span_ignores_day_of_month() {
        assert_eq!(month_span(date(2025, 1, 1), date(2025, 7, 1)), 6);
        assert_eq!(month_span(date(2024, 1, 1), date(2024, 12, 31)), 11);
        assert_eq!(month_span(date(2024, 11, 30), date(2025, 2, 1)), 3);
    }

    #[test]
    fn name_length_counts_characters_not_bytes() {
        let rules = ProgramRules::default();
        assert!(rules.check_name_length("ÅÄÖ").is_ok());
        let err = rules.check_name_length("AI").unwrap_err();
        assert_eq!(err.rule, ValidationRule::NameTooShort);
        assert_eq!(err.value, "AI");
        assert!(err.message.contains("at least 3 characters"));
    }

    #[test]
    fn equal_dates_are_an_invalid_range() {
        let rules = ProgramRules::default();
        let err = rules
            .check_date_range(date(2025, 3, 1), date(2025, 3, 1))
            .unwrap_err();
        assert_eq!(err.rule, ValidationRule::InvalidDateRange);
    }

    #[test]
    fn duration_span_respects_tolerance() {
        let rules = ProgramRules::default();
        let (start, end) = (date(2025, 1, 1), date(2025, 7, 1));

        assert!(rules.check_duration_span(start, end, 5).is_ok());
        assert!(rules.check_duration_span(start, end, 6).is_ok());
        assert!(rules.check_duration_span(start, end, 7).is_ok());

        let err = rules.check_duration_span(start, end, 8).unwrap_err();
        assert_eq!(err.rule, ValidationRule::DurationDateMismatch);
        assert_eq!(err.value, "8");
    }

    #[test]
    fn zero_tolerance_requires_exact_span() {
        let rules = ProgramRules {
            duration_tolerance_months: 0,
            ..ProgramRules::default()
        };
        let (start, end) = (date(2025, 1, 1), date(2025, 7, 1));
        assert!(rules.check_duration_span(start, end, 6).is_ok());
        assert!(rules.check_duration_span(start, end, 7).is_err());
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        let rules = ProgramRules::default();
        assert_eq!(
            rules.check_duration_positive(0).unwrap_err().rule,
            ValidationRule::NonPositiveDuration
        );
        assert!(rules.check_duration_positive(-3).is_err());
        assert!(rules.check_duration_positive(1).is_ok());
    }
}
