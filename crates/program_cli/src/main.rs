//! Composition entry point: wires the SQLite store into the program service.
//!
//! # Responsibility
//! - Pick the persistent repository; the core never defaults one itself.
//! - Render service results as JSON and rule violations verbatim.

mod args;

use anyhow::{anyhow, Context};
use args::{Cli, Command};
use clap::Parser;
use log::info;
use program_core::db::open_db;
use program_core::{
    default_log_level, init_logging, ProgramRules, ProgramService, ProgramServiceError,
    SqliteProgramRepository,
};
use serde_json::json;
use std::process::ExitCode;

const EXIT_VALIDATION: u8 = 2;
const EXIT_NOT_FOUND: u8 = 3;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(log_dir) = &cli.log_dir {
        let log_dir = log_dir
            .to_str()
            .context("log directory must be valid UTF-8")?;
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(|err| anyhow!(err))?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    let repo = SqliteProgramRepository::try_new(&conn)?;
    let rules = ProgramRules {
        duration_tolerance_months: cli.duration_tolerance,
        ..ProgramRules::default()
    };
    let service = ProgramService::with_rules(repo, rules);
    info!("event=cli_start module=cli status=ok db={}", cli.db.display());

    let output = match cli.command {
        Command::Create(args) => serde_json::to_value(service.create_program(&args.into())?)?,
        Command::Update(args) => {
            serde_json::to_value(service.update_program(args.id, &args.changes())?)?
        }
        Command::Delete { id } => {
            service.delete_program(id)?;
            json!({ "deleted": id })
        }
        Command::Get { id } => serde_json::to_value(service.get_program(id)?)?,
        Command::List => serde_json::to_value(service.list_programs()?)?,
        Command::Search { query } => serde_json::to_value(service.search_programs(&query)?)?,
        Command::Duration { min, max } => {
            serde_json::to_value(service.filter_by_duration(min, max)?)?
        }
        Command::Stats => serde_json::to_value(service.compute_statistics()?)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn report(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ProgramServiceError>() {
        Some(ProgramServiceError::Validation(validation)) => {
            eprintln!("error[{}]: {}", validation.rule.code(), validation.message);
            ExitCode::from(EXIT_VALIDATION)
        }
        Some(not_found @ ProgramServiceError::NotFound(_)) => {
            eprintln!("error[not_found]: {not_found}");
            ExitCode::from(EXIT_NOT_FOUND)
        }
        _ => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
