//! Command-line surface for the program registry.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use program_core::{ProgramChanges, ProgramDraft, ProgramId};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "programs", version, about = "Manage program records")]
pub struct Cli {
    /// SQLite database file; created and migrated on first use.
    #[arg(long, env = "PROGRAMS_DB", default_value = "programs.sqlite3")]
    pub db: PathBuf,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "PROGRAMS_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "PROGRAMS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Allowed gap in months between duration and the date span.
    #[arg(long, env = "PROGRAMS_DURATION_TOLERANCE", default_value_t = 1)]
    pub duration_tolerance: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a program.
    Create(CreateArgs),
    /// Change fields of an existing program.
    Update(UpdateArgs),
    /// Delete a program by id.
    Delete { id: ProgramId },
    /// Show one program.
    Get { id: ProgramId },
    /// List every program in creation order.
    List,
    /// Case-insensitive name search.
    Search { query: String },
    /// Programs whose duration lies in an inclusive month range.
    Duration { min: i32, max: i32 },
    /// Aggregate statistics.
    Stats,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value = "")]
    pub national_alignment: String,
    #[arg(long, default_value = "")]
    pub focus_areas: String,
    #[arg(long, default_value = "")]
    pub phases: String,
    /// YYYY-MM-DD
    #[arg(long)]
    pub start: NaiveDate,
    /// YYYY-MM-DD
    #[arg(long)]
    pub end: NaiveDate,
    /// Whole months.
    #[arg(long)]
    pub duration: i32,
    #[arg(long)]
    pub inactive: bool,
}

impl From<CreateArgs> for ProgramDraft {
    fn from(args: CreateArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            national_alignment: args.national_alignment,
            focus_areas: args.focus_areas,
            phases: args.phases,
            start_date: args.start,
            end_date: args.end,
            duration_months: args.duration,
            active: !args.inactive,
        }
    }
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub id: ProgramId,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub national_alignment: Option<String>,
    #[arg(long)]
    pub focus_areas: Option<String>,
    #[arg(long)]
    pub phases: Option<String>,
    #[arg(long)]
    pub start: Option<NaiveDate>,
    #[arg(long)]
    pub end: Option<NaiveDate>,
    #[arg(long)]
    pub duration: Option<i32>,
    #[arg(long)]
    pub active: Option<bool>,
}

impl UpdateArgs {
    pub fn changes(&self) -> ProgramChanges {
        ProgramChanges {
            name: self.name.clone(),
            description: self.description.clone(),
            national_alignment: self.national_alignment.clone(),
            focus_areas: self.focus_areas.clone(),
            phases: self.phases.clone(),
            start_date: self.start,
            end_date: self.end,
            duration_months: self.duration,
            active: self.active,
        }
    }
}
