//! Program repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the fixed CRUD/query port the program service depends on.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Repositories never run business validation; that belongs to the service.
//! - `get_all` and `search` return records in insertion (ascending id) order.
//! - Missing ids surface as `None`/`false`/`RepoError::NotFound`, never as
//!   transport errors.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::program::{name_key, Program, ProgramChanges, ProgramDraft, ProgramId};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PROGRAM_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    national_alignment,
    focus_areas,
    phases,
    start_date,
    end_date,
    duration_months,
    active
FROM programs";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for program persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(ProgramId),
    /// Storage-level uniqueness backstop rejected the name.
    DuplicateName(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "program not found: {id}"),
            Self::DuplicateName(name) => write!(f, "program name already stored: `{name}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted program data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateName(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Search criteria understood by every repository implementation.
///
/// All set criteria must match; an empty query matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramQuery {
    /// Case-insensitive substring of `name`.
    pub name_contains: Option<String>,
    /// Inclusive lower bound on `duration_months`.
    pub min_duration_months: Option<i32>,
    /// Inclusive upper bound on `duration_months`.
    pub max_duration_months: Option<i32>,
    pub active: Option<bool>,
}

impl ProgramQuery {
    pub fn name_contains(fragment: impl Into<String>) -> Self {
        Self {
            name_contains: Some(fragment.into()),
            ..Self::default()
        }
    }

    pub fn duration_between(min_months: i32, max_months: i32) -> Self {
        Self {
            min_duration_months: Some(min_months),
            max_duration_months: Some(max_months),
            ..Self::default()
        }
    }

    /// In-process evaluation of this query against one record.
    pub fn matches(&self, program: &Program) -> bool {
        if let Some(fragment) = &self.name_contains {
            if !name_key(&program.name).contains(&name_key(fragment)) {
                return false;
            }
        }
        if self
            .min_duration_months
            .is_some_and(|min| program.duration_months < min)
        {
            return false;
        }
        if self
            .max_duration_months
            .is_some_and(|max| program.duration_months > max)
        {
            return false;
        }
        self.active.map_or(true, |active| program.active == active)
    }
}

/// Storage port for program records.
pub trait ProgramRepository {
    /// Stores a new record and returns it with its assigned id.
    fn create(&self, draft: &ProgramDraft) -> RepoResult<Program>;
    fn get_by_id(&self, id: ProgramId) -> RepoResult<Option<Program>>;
    fn get_all(&self) -> RepoResult<Vec<Program>>;
    /// Case-insensitive exact match against every stored name.
    fn exists_by_name(&self, name: &str) -> RepoResult<bool>;
    /// Applies `changes` to the stored record; `NotFound` when `id` is absent.
    fn update(&self, id: ProgramId, changes: &ProgramChanges) -> RepoResult<Program>;
    /// Returns `false` when `id` is absent.
    fn delete(&self, id: ProgramId) -> RepoResult<bool>;
    fn search(&self, query: &ProgramQuery) -> RepoResult<Vec<Program>>;
    fn count(&self) -> RepoResult<usize>;
}

impl<R: ProgramRepository + ?Sized> ProgramRepository for &R {
    fn create(&self, draft: &ProgramDraft) -> RepoResult<Program> {
        (**self).create(draft)
    }

    fn get_by_id(&self, id: ProgramId) -> RepoResult<Option<Program>> {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> RepoResult<Vec<Program>> {
        (**self).get_all()
    }

    fn exists_by_name(&self, name: &str) -> RepoResult<bool> {
        (**self).exists_by_name(name)
    }

    fn update(&self, id: ProgramId, changes: &ProgramChanges) -> RepoResult<Program> {
        (**self).update(id, changes)
    }

    fn delete(&self, id: ProgramId) -> RepoResult<bool> {
        (**self).delete(id)
    }

    fn search(&self, query: &ProgramQuery) -> RepoResult<Vec<Program>> {
        (**self).search(query)
    }

    fn count(&self) -> RepoResult<usize> {
        (**self).count()
    }
}

/// SQLite-backed program repository.
pub struct SqliteProgramRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProgramRepository<'conn> {
    /// Constructs a repository from a fully migrated connection.
    ///
    /// # Errors
    /// - `DbError::SchemaNotReady` when migrations have not been applied.
    /// - `DbError::UnsupportedSchemaVersion` when the schema is newer than
    ///   this binary.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let db_version = current_user_version(conn)?;
        let expected = latest_version();
        if db_version > expected {
            return Err(DbError::UnsupportedSchemaVersion {
                db_version,
                latest_supported: expected,
            }
            .into());
        }
        if db_version < expected {
            return Err(DbError::SchemaNotReady {
                db_version,
                expected,
            }
            .into());
        }
        Ok(Self { conn })
    }
}

impl ProgramRepository for SqliteProgramRepository<'_> {
    fn create(&self, draft: &ProgramDraft) -> RepoResult<Program> {
        self.conn
            .execute(
                "INSERT INTO programs (
                    name,
                    name_key,
                    description,
                    national_alignment,
                    focus_areas,
                    phases,
                    start_date,
                    end_date,
                    duration_months,
                    active
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                params![
                    draft.name.as_str(),
                    name_key(&draft.name),
                    draft.description.as_str(),
                    draft.national_alignment.as_str(),
                    draft.focus_areas.as_str(),
                    draft.phases.as_str(),
                    draft.start_date,
                    draft.end_date,
                    draft.duration_months,
                    bool_to_int(draft.active),
                ],
            )
            .map_err(|err| map_write_error(err, &draft.name))?;

        let id = self.conn.last_insert_rowid();
        debug!("event=program_insert module=repo status=ok id={id}");
        Ok(draft.clone().into_program(id))
    }

    fn get_by_id(&self, id: ProgramId) -> RepoResult<Option<Program>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROGRAM_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_program_row(row)?));
        }

        Ok(None)
    }

    fn get_all(&self) -> RepoResult<Vec<Program>> {
        self.search(&ProgramQuery::default())
    }

    fn exists_by_name(&self, name: &str) -> RepoResult<bool> {
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM programs WHERE name_key = ?1 LIMIT 1;",
                [name_key(name)],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }

    fn update(&self, id: ProgramId, changes: &ProgramChanges) -> RepoResult<Program> {
        let current = self.get_by_id(id)?.ok_or(RepoError::NotFound(id))?;
        let merged = changes.apply_to(&current);

        let changed = self
            .conn
            .execute(
                "UPDATE programs
                 SET
                    name = ?1,
                    name_key = ?2,
                    description = ?3,
                    national_alignment = ?4,
                    focus_areas = ?5,
                    phases = ?6,
                    start_date = ?7,
                    end_date = ?8,
                    duration_months = ?9,
                    active = ?10,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?11;",
                params![
                    merged.name.as_str(),
                    name_key(&merged.name),
                    merged.description.as_str(),
                    merged.national_alignment.as_str(),
                    merged.focus_areas.as_str(),
                    merged.phases.as_str(),
                    merged.start_date,
                    merged.end_date,
                    merged.duration_months,
                    bool_to_int(merged.active),
                    id,
                ],
            )
            .map_err(|err| map_write_error(err, &merged.name))?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(merged)
    }

    fn delete(&self, id: ProgramId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM programs WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn search(&self, query: &ProgramQuery) -> RepoResult<Vec<Program>> {
        let mut sql = format!("{PROGRAM_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(fragment) = &query.name_contains {
            sql.push_str(" AND instr(name_key, ?) > 0");
            bind_values.push(Value::Text(name_key(fragment)));
        }
        if let Some(min) = query.min_duration_months {
            sql.push_str(" AND duration_months >= ?");
            bind_values.push(Value::Integer(i64::from(min)));
        }
        if let Some(max) = query.max_duration_months {
            sql.push_str(" AND duration_months <= ?");
            bind_values.push(Value::Integer(i64::from(max)));
        }
        if let Some(active) = query.active {
            sql.push_str(" AND active = ?");
            bind_values.push(Value::Integer(bool_to_int(active)));
        }

        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut programs = Vec::new();

        while let Some(row) = rows.next()? {
            programs.push(parse_program_row(row)?);
        }

        Ok(programs)
    }

    fn count(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM programs;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative program count `{count}`")))
    }
}

fn parse_program_row(row: &Row<'_>) -> RepoResult<Program> {
    let active = match row.get::<_, i64>("active")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid active value `{other}` in programs.active"
            )));
        }
    };

    Ok(Program {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        national_alignment: row.get("national_alignment")?,
        focus_areas: row.get("focus_areas")?,
        phases: row.get("phases")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        duration_months: row.get("duration_months")?,
        active,
    })
}

fn map_write_error(err: rusqlite::Error, name: &str) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::DuplicateName(name.to_string())
        }
        _ => err.into(),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
