use chrono::NaiveDate;
use program_core::db::{open_db, open_db_in_memory};
use program_core::{
    ProgramChanges, ProgramDraft, ProgramQuery, ProgramRepository, ProgramService,
    ProgramServiceError, RepoError, SqliteProgramRepository, ValidationRule,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn draft(name: &str, duration_months: i32) -> ProgramDraft {
    let start = date(2025, 1, 1);
    let end = start
        .checked_add_months(chrono::Months::new(duration_months as u32))
        .unwrap();
    ProgramDraft::new(name, start, end, duration_months)
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProgramRepository::try_new(&conn).unwrap();

    let mut input = draft("AI Program", 6);
    input.description = "applied machine learning".to_string();
    input.national_alignment = "Vision 2030".to_string();
    input.focus_areas = "ml, data".to_string();
    input.phases = "pilot; rollout".to_string();
    let created = repo.create(&input).unwrap();

    let loaded = repo.get_by_id(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.id, 1);
    assert_eq!(loaded.description, "applied machine learning");
    assert_eq!(loaded.national_alignment, "Vision 2030");
    assert_eq!(loaded.focus_areas, "ml, data");
    assert_eq!(loaded.phases, "pilot; rollout");
    assert_eq!(loaded.start_date, date(2025, 1, 1));
    assert_eq!(loaded.end_date, date(2025, 7, 1));
}

#[test]
fn get_missing_id_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProgramRepository::try_new(&conn).unwrap();

    assert!(repo.get_by_id(7).unwrap().is_none());
}

#[test]
fn exists_by_name_ignores_case() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProgramRepository::try_new(&conn).unwrap();
    repo.create(&draft("AI Program", 6)).unwrap();

    assert!(repo.exists_by_name("ai program").unwrap());
    assert!(repo.exists_by_name("AI PROGRAM").unwrap());
    assert!(!repo.exists_by_name("AI Programs").unwrap());
}

#[test]
fn unique_constraint_backstops_duplicate_names() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProgramRepository::try_new(&conn).unwrap();
    repo.create(&draft("AI Program", 6)).unwrap();

    let err = repo.create(&draft("ai PROGRAM", 3)).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateName(ref name) if name == "ai PROGRAM"));
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn unique_constraint_folds_non_ascii_case() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProgramRepository::try_new(&conn).unwrap();
    repo.create(&draft("Éducation Lab", 6)).unwrap();

    let err = repo.create(&draft("éducation lab", 6)).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateName(_)));
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn update_keeps_alignment_fields_not_in_changes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProgramRepository::try_new(&conn).unwrap();
    let mut input = draft("AI Program", 6);
    input.focus_areas = "ml".to_string();
    let created = repo.create(&input).unwrap();

    let changes = ProgramChanges {
        phases: Some("pilot".to_string()),
        ..ProgramChanges::default()
    };
    let updated = repo.update(created.id, &changes).unwrap();

    assert_eq!(updated.focus_areas, "ml");
    assert_eq!(updated.phases, "pilot");
    assert_eq!(updated.national_alignment, "");
    assert_eq!(repo.get_by_id(created.id).unwrap().unwrap(), updated);
}

#[test]
fn update_rename_onto_existing_name_hits_backstop() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProgramRepository::try_new(&conn).unwrap();
    repo.create(&draft("AI Program", 6)).unwrap();
    let lab = repo.create(&draft("Data Lab", 3)).unwrap();

    let changes = ProgramChanges {
        name: Some("AI program".to_string()),
        ..ProgramChanges::default()
    };
    let err = repo.update(lab.id, &changes).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateName(_)));
}

#[test]
fn update_applies_only_given_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProgramRepository::try_new(&conn).unwrap();
    let created = repo.create(&draft("AI Program", 6)).unwrap();

    let changes = ProgramChanges {
        duration_months: Some(7),
        active: Some(false),
        ..ProgramChanges::default()
    };
    let updated = repo.update(created.id, &changes).unwrap();

    assert_eq!(updated.name, "AI Program");
    assert_eq!(updated.duration_months, 7);
    assert!(!updated.active);
    assert_eq!(repo.get_by_id(created.id).unwrap().unwrap(), updated);
}

#[test]
fn update_not_found_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProgramRepository::try_new(&conn).unwrap();

    let err = repo.update(3, &ProgramChanges::default()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(3)));
}

#[test]
fn delete_reports_whether_a_row_was_removed() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProgramRepository::try_new(&conn).unwrap();
    let created = repo.create(&draft("AI Program", 6)).unwrap();

    assert!(repo.delete(created.id).unwrap());
    assert!(!repo.delete(created.id).unwrap());
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn ids_are_not_reused_after_delete() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProgramRepository::try_new(&conn).unwrap();

    let first = repo.create(&draft("First Track", 3)).unwrap();
    let second = repo.create(&draft("Second Track", 3)).unwrap();
    repo.delete(second.id).unwrap();
    let third = repo.create(&draft("Third Track", 3)).unwrap();

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(third.id, 3);
}

#[test]
fn search_combines_criteria() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProgramRepository::try_new(&conn).unwrap();
    repo.create(&draft("Robotics Lab", 3)).unwrap();
    repo.create(&draft("Data Lab", 6)).unwrap();
    let mut archived = draft("Hardware Lab", 6);
    archived.active = false;
    repo.create(&archived).unwrap();
    repo.create(&draft("AI Program", 6)).unwrap();

    let query = ProgramQuery {
        name_contains: Some("LAB".to_string()),
        min_duration_months: Some(4),
        max_duration_months: Some(6),
        active: Some(true),
    };
    let found = repo.search(&query).unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Data Lab");
}

#[test]
fn service_over_sqlite_rejects_case_insensitive_duplicate() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProgramRepository::try_new(&conn).unwrap();
    repo.create(&draft("AI Program", 6)).unwrap();
    let service = ProgramService::new(repo);

    let err = service.create_program(&draft("ai program", 6)).unwrap_err();
    match err {
        ProgramServiceError::Validation(validation) => {
            assert_eq!(validation.rule, ValidationRule::DuplicateName);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn service_over_sqlite_rejects_non_ascii_case_duplicate() {
    let conn = open_db_in_memory().unwrap();
    let service = ProgramService::new(SqliteProgramRepository::try_new(&conn).unwrap());
    service.create_program(&draft("Éducation Lab", 6)).unwrap();

    let err = service
        .create_program(&draft("éducation lab", 6))
        .unwrap_err();
    let validation = err.validation().expect("should be a validation error");
    assert_eq!(validation.rule, ValidationRule::DuplicateName);
    assert_eq!(service.list_programs().unwrap().len(), 1);
}

#[test]
fn file_database_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("programs.db");

    {
        let conn = open_db(&path).unwrap();
        let service = ProgramService::new(SqliteProgramRepository::try_new(&conn).unwrap());
        service.create_program(&draft("AI Program", 6)).unwrap();
        service.create_program(&draft("Data Lab", 3)).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let service = ProgramService::new(SqliteProgramRepository::try_new(&conn).unwrap());
    let names: Vec<String> = service
        .list_programs()
        .unwrap()
        .into_iter()
        .map(|program| program.name)
        .collect();
    assert_eq!(names, ["AI Program", "Data Lab"]);

    let stats = service.compute_statistics().unwrap();
    assert_eq!(stats.total_programs, 2);
    assert_eq!(stats.average_duration_months, 4.5);
}
