//! Volatile in-memory program repository.
//!
//! # Responsibility
//! - Satisfy the `ProgramRepository` contract without any I/O.
//! - Let service rules be exercised in isolation and reset between runs.
//!
//! # Invariants
//! - Ids start at 1 and increase monotonically until `reset()`.
//! - Records are kept in insertion order.

use crate::model::program::{name_key, Program, ProgramChanges, ProgramDraft, ProgramId};
use crate::repo::program_repo::{ProgramQuery, ProgramRepository, RepoError, RepoResult};
use std::cell::RefCell;

const FIRST_ID: ProgramId = 1;

#[derive(Debug)]
struct MemoryState {
    programs: Vec<Program>,
    next_id: ProgramId,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            programs: Vec::new(),
            next_id: FIRST_ID,
        }
    }
}

/// In-memory program store backed by an ordered `Vec`.
#[derive(Debug, Default)]
pub struct InMemoryProgramRepository {
    state: RefCell<MemoryState>,
}

impl InMemoryProgramRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every record and restarts id assignment at 1.
    pub fn reset(&self) {
        *self.state.borrow_mut() = MemoryState::default();
    }

    pub fn len(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProgramRepository for InMemoryProgramRepository {
    fn create(&self, draft: &ProgramDraft) -> RepoResult<Program> {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;

        let program = draft.clone().into_program(id);
        state.programs.push(program.clone());
        Ok(program)
    }

    fn get_by_id(&self, id: ProgramId) -> RepoResult<Option<Program>> {
        Ok(self
            .state
            .borrow()
            .programs
            .iter()
            .find(|program| program.id == id)
            .cloned())
    }

    fn get_all(&self) -> RepoResult<Vec<Program>> {
        Ok(self.state.borrow().programs.clone())
    }

    fn exists_by_name(&self, name: &str) -> RepoResult<bool> {
        let needle = name_key(name);
        Ok(self
            .state
            .borrow()
            .programs
            .iter()
            .any(|program| name_key(&program.name) == needle))
    }

    fn update(&self, id: ProgramId, changes: &ProgramChanges) -> RepoResult<Program> {
        let mut state = self.state.borrow_mut();
        let slot = state
            .programs
            .iter_mut()
            .find(|program| program.id == id)
            .ok_or(RepoError::NotFound(id))?;

        *slot = changes.apply_to(slot);
        Ok(slot.clone())
    }

    fn delete(&self, id: ProgramId) -> RepoResult<bool> {
        let mut state = self.state.borrow_mut();
        match state.programs.iter().position(|program| program.id == id) {
            Some(index) => {
                state.programs.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn search(&self, query: &ProgramQuery) -> RepoResult<Vec<Program>> {
        Ok(self
            .state
            .borrow()
            .programs
            .iter()
            .filter(|program| query.matches(program))
            .cloned()
            .collect())
    }

    fn count(&self) -> RepoResult<usize> {
        Ok(self.len())
    }
}
