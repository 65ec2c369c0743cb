use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use booking_engine::temporal::{parse_date, parse_rfc3339, utc_midnight};
use booking_engine::{
    expand_for_day, find_conflict, list_in_range, Appointment, BlockBookingId, BlockBookingList,
    BlockBookingStore, BookingError, InMemoryStore, IntervalView, DEFAULT_TIMEZONE,
    MAX_DURATION_MINUTES,
};

/// Exit status for caller errors such as an unknown timezone.
const EXIT_BAD_REQUEST: u8 = 4;
/// Exit status for an invalid date or a missing block booking.
const EXIT_NOT_FOUND: u8 = 5;

#[derive(Parser)]
#[command(name = "blockbook", version, about = "Check appointments against block bookings")]
struct Cli {
    /// Bookings file in `{"blockBookings": [...]}` form
    #[arg(long, short = 'd', env = "BLOCKBOOK_DATA")]
    data: PathBuf,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report the first block booking overlapping a proposed appointment
    Check {
        /// Appointment start, RFC 3339 with offset
        #[arg(long)]
        start: String,

        /// Appointment length in minutes, at most one leap year
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..=MAX_DURATION_MINUTES))]
        duration: i64,
    },

    /// List block bookings starting on a local calendar day
    Day {
        /// Date as YYYY-MM-DD
        date: String,

        /// IANA timezone defining the day
        #[arg(long, env = "BLOCKBOOK_TZ", default_value = DEFAULT_TIMEZONE)]
        tz: String,
    },

    /// Show a block booking's occurrences on a UTC calendar day
    Occurrences {
        id: String,

        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: String,
    },

    /// List every block booking in id order
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<BookingError>() {
        Some(BookingError::UnknownTimeZone(_)) => EXIT_BAD_REQUEST,
        Some(BookingError::InvalidDate(_)) | Some(BookingError::NotFound(_)) => EXIT_NOT_FOUND,
        _ => 1,
    }
}

fn run(cli: Cli) -> Result<()> {
    let store = load_store(&cli.data)?;

    let output = match cli.command {
        Command::Check { start, duration } => {
            let appointment = Appointment::new(parse_rfc3339(&start)?, duration);
            let conflict = find_conflict(&store, &appointment)?;
            json!({ "conflict": conflict })
        }
        Command::Day { date, tz } => {
            let block_bookings = list_in_range(&store, &date, &tz)?;
            serde_json::to_value(BlockBookingList { block_bookings })?
        }
        Command::Occurrences { id, date } => {
            let id = BlockBookingId::from(id);
            let booking = store
                .get(&id)?
                .ok_or_else(|| BookingError::NotFound(id.clone()))?;
            let day = utc_midnight(parse_date(&date)?);
            let occurrences: Vec<IntervalView> = expand_for_day(&booking, day)?
                .iter()
                .map(IntervalView::from)
                .collect();
            json!({ "id": id, "occurrences": occurrences })
        }
        Command::List => serde_json::to_value(BlockBookingList {
            block_bookings: store.get_all()?,
        })?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_store(path: &Path) -> Result<InMemoryStore> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read bookings file {}", path.display()))?;
    let list = BlockBookingList::from_json(&text)?;
    let store = InMemoryStore::from_bookings(list.block_bookings)?;
    let count = store.count()?;
    debug!(path = %path.display(), count, "loaded block bookings");
    Ok(store)
}
