// ABOUTME: Crux CLI - command-line front end for the climbing-training coach
// ABOUTME: Runs assessment, planning, replanning, feedback, and log tooling against a data directory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach
//!
//! Usage:
//! ```bash
//! # Onboard from an intake form, then plan the current week
//! crux-cli onboard intake.json
//! crux-cli week 0
//!
//! # Resolve a session for a gym on a given day
//! crux-cli resolve strength_long --location gym --gym blocx --date 2026-03-03
//!
//! # Train strength tomorrow instead of what was planned
//! crux-cli override strength --reference 2026-03-03
//!
//! # Validate and append a session log entry (exit 0 ok, 2 invalid, 3 legacy)
//! crux-cli log append entry.json
//!
//! # Outdoor statistics since a date
//! crux-cli outdoor stats --since 2026-01-01
//! ```

mod commands;
mod helpers;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use crux_coach::coach::Coach;
use crux_coach::config::CoachConfig;
use crux_coach::logging::LoggingConfig;
use crux_core::errors::AppResult;
use tracing::{error, info};

type Result<T> = AppResult<T>;

#[derive(Parser)]
#[command(
    name = "crux-cli",
    about = "Crux climbing-training coach",
    long_about = "Plan, adapt, and log climbing training from the command line. Request documents are JSON files; `-` reads stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Data directory override (defaults to CRUX_DATA_DIR or ./data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// User-state commands
    State {
        #[command(subcommand)]
        action: StateCommand,
    },

    /// Catalog listings
    Catalog {
        #[command(subcommand)]
        action: CatalogCommand,
    },

    /// Compute the six-axis assessment profile
    Assess {
        /// Request with optional `assessment` and `goal`; the stored ones otherwise
        file: Option<PathBuf>,
    },

    /// Macrocycle commands
    Macrocycle {
        #[command(subcommand)]
        action: MacrocycleCommand,
    },

    /// Plan a week of the macrocycle (0 = current week)
    Week {
        /// Week number
        #[arg(default_value = "0")]
        week_num: u32,

        /// Print only the day summary, not the full plan
        #[arg(long)]
        summary: bool,
    },

    /// Resolve a catalog session into concrete exercises
    Resolve {
        /// Session id
        session_id: String,

        /// Location (gym, home, outdoor)
        #[arg(long)]
        location: Option<String>,

        /// Gym id
        #[arg(long)]
        gym: Option<String>,

        /// Day the session is for (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Train a different intent on a day of the current plan
    Override {
        /// Intent (strength, power, technique, rest, ...)
        intent: String,

        /// Day the user acts from (YYYY-MM-DD)
        #[arg(long)]
        reference: String,

        /// Day to change (defaults to the day after the reference)
        #[arg(long)]
        target: Option<String>,

        /// Location of the new session
        #[arg(long, default_value = "gym")]
        location: String,

        /// Slot of the new session
        #[arg(long, default_value = "evening")]
        slot: String,

        /// Gym id
        #[arg(long)]
        gym: Option<String>,
    },

    /// Apply replanning events from a file
    Events {
        /// `{events, week_plan?}` document
        file: PathBuf,
    },

    /// Add a session to a free slot of the current plan
    QuickAdd {
        /// Session id
        session_id: String,

        /// Day (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Slot
        #[arg(long, default_value = "evening")]
        slot: String,

        /// Location
        #[arg(long, default_value = "gym")]
        location: String,

        /// Gym id
        #[arg(long)]
        gym: Option<String>,
    },

    /// Suggest sessions for a day of the current plan
    Suggest {
        /// Day (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Location
        #[arg(long, default_value = "gym")]
        location: String,

        /// Maximum suggestions
        #[arg(long, default_value = "3")]
        limit: usize,
    },

    /// Apply session feedback from a file
    Feedback {
        /// `{log_entry, resolved_day?, status?}` document
        file: PathBuf,
    },

    /// Daily loop commands
    Day {
        #[command(subcommand)]
        action: DayCommand,
    },

    /// Complete onboarding from an intake form
    Onboard {
        /// Intake document
        file: PathBuf,
    },

    /// Session log tooling
    Log {
        #[command(subcommand)]
        action: LogCommand,
    },

    /// Outdoor climbing log
    Outdoor {
        #[command(subcommand)]
        action: OutdoorCommand,
    },
}

#[non_exhaustive]
#[derive(Subcommand)]
enum StateCommand {
    /// Print the user state
    Show,

    /// Deep-merge a partial document into the state
    Patch {
        /// Partial state document
        file: PathBuf,
    },

    /// Replace the state with the empty template
    Reset,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum CatalogCommand {
    /// List exercises
    Exercises,

    /// List sessions
    Sessions,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum MacrocycleCommand {
    /// Generate a macrocycle from the stored goal and profile
    Generate {
        /// Monday of week 1 (defaults to this week's Monday)
        #[arg(long)]
        start: Option<String>,

        /// Total weeks
        #[arg(long, default_value = "12")]
        weeks: u32,
    },
}

#[non_exhaustive]
#[derive(Subcommand)]
enum DayCommand {
    /// Close a resolved day and append its log entry
    Close {
        /// `{resolved_day, status?, notes?, actual?}` document
        file: PathBuf,
    },
}

#[non_exhaustive]
#[derive(Subcommand)]
enum LogCommand {
    /// Validate and append one entry (exit 0 ok, 2 invalid, 3 legacy)
    Append {
        /// Entry document
        file: PathBuf,
    },

    /// Check every line of a session log (exit 0 ok, 2 invalid)
    Validate {
        /// JSONL file
        file: PathBuf,
    },
}

#[non_exhaustive]
#[derive(Subcommand)]
enum OutdoorCommand {
    /// Validate and append an outdoor session
    Add {
        /// Session document
        file: PathBuf,
    },

    /// List outdoor sessions
    Sessions {
        /// Only sessions on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
    },

    /// Outdoor statistics
    Stats {
        /// Only sessions on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn coach_config(data_dir: Option<PathBuf>) -> Result<CoachConfig> {
    match data_dir {
        Some(dir) => Ok(CoachConfig::with_data_dir(dir)),
        None => CoachConfig::from_env(),
    }
}

/// Run one command and return the process exit code
fn run(cli: Cli) -> Result<i32> {
    let coach = Coach::new(coach_config(cli.data_dir)?);
    info!(data_dir = %coach.config().data_dir.display(), "crux-cli");

    match cli.command {
        Command::State { action } => match action {
            StateCommand::Show => commands::state::show(&coach)?,
            StateCommand::Patch { file } => commands::state::patch(&coach, &file)?,
            StateCommand::Reset => commands::state::reset(&coach)?,
        },
        Command::Catalog { action } => match action {
            CatalogCommand::Exercises => commands::state::exercises(&coach)?,
            CatalogCommand::Sessions => commands::state::sessions(&coach)?,
        },
        Command::Assess { file } => commands::planning::assess(&coach, file.as_deref())?,
        Command::Macrocycle { action } => match action {
            MacrocycleCommand::Generate { start, weeks } => {
                commands::planning::generate_macrocycle(&coach, start.as_deref(), weeks)?;
            }
        },
        Command::Week { week_num, summary } => {
            commands::planning::week(&coach, week_num, summary)?;
        }
        Command::Resolve {
            session_id,
            location,
            gym,
            date,
        } => commands::planning::resolve(
            &coach,
            session_id,
            location.as_deref(),
            gym,
            date.as_deref(),
        )?,
        Command::Override {
            intent,
            reference,
            target,
            location,
            slot,
            gym,
        } => commands::replan::override_day(
            &coach,
            commands::replan::OverrideArgs {
                intent,
                reference,
                target,
                location,
                slot,
                gym,
            },
        )?,
        Command::Events { file } => commands::replan::events(&coach, &file)?,
        Command::QuickAdd {
            session_id,
            date,
            slot,
            location,
            gym,
        } => commands::replan::quick_add(&coach, session_id, &date, &slot, &location, gym)?,
        Command::Suggest {
            date,
            location,
            limit,
        } => commands::replan::suggest(&coach, &date, &location, limit)?,
        Command::Feedback { file } => commands::feedback::feedback(&coach, &file)?,
        Command::Day { action } => match action {
            DayCommand::Close { file } => commands::feedback::close_day(&coach, &file)?,
        },
        Command::Onboard { file } => commands::feedback::onboard(&coach, &file)?,
        Command::Log { action } => {
            return match action {
                LogCommand::Append { file } => commands::logs::append(&coach, &file),
                LogCommand::Validate { file } => commands::logs::validate(&file),
            };
        }
        Command::Outdoor { action } => match action {
            OutdoorCommand::Add { file } => commands::logs::outdoor_add(&coach, &file)?,
            OutdoorCommand::Sessions { since } => {
                commands::logs::outdoor_sessions(&coach, since.as_deref())?;
            }
            OutdoorCommand::Stats { since, json } => {
                commands::logs::outdoor_stats(&coach, since.as_deref(), json)?;
            }
        },
    }

    Ok(0)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = LoggingConfig::for_cli(cli.verbose).init() {
        eprintln!("Logging disabled: {e}");
    }

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            error!(code = ?e.code, "{}", e.message);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
