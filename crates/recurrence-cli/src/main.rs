//! `recur` CLI: validate, expand and serialize recurrence rules from the
//! command line.
//!
//! ## Usage
//!
//! ```sh
//! # Check a rule
//! recur validate 'FREQ=WEEKLY;BYDAY=MO,WE,FR'
//!
//! # Occurrences inside a window, one per line
//! recur expand --rule 'FREQ=MONTHLY;BYMONTHDAY=-1' \
//!   --start 2015-01-01T09:00:00 --min 2015-01-01 --max 2015-06-30
//!
//! # Same, as a JSON array, skipping one date
//! recur expand --rule FREQ=DAILY --start 2015-01-01 --min 2015-01-01 \
//!   --max 2015-01-07 --exception 20150103 --json
//!
//! # Settings JSON → rule string
//! echo '{"freq":"DAILY","interval":2}' | recur serialize
//!
//! # ASCII date tokens
//! recur decode 20150105T093000Z --offset 60
//! recur encode 2015-01-05T10:30:00 --offset 60
//! ```
//!
//! Offsets are minutes east of UTC. Set `RUST_LOG=debug` to see what the
//! engine is doing on stderr.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use recurrence_engine::{FixedOffsetMinutes, GenerationRequest, RecurrenceSettings};
use std::io::{self, Read};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recur", version, about = "Recurrence rule (RRULE) CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a rule string is valid
    Validate {
        /// Rule string, e.g. 'FREQ=DAILY;INTERVAL=2'
        rule: String,
    },
    /// List the occurrences of a rule inside a window
    Expand {
        /// Rule string
        #[arg(long)]
        rule: String,
        /// Seed occurrence (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
        #[arg(long)]
        start: String,
        /// End of the seed occurrence
        #[arg(long)]
        end: Option<String>,
        /// Start of the window (inclusive)
        #[arg(long)]
        min: String,
        /// End of the window (inclusive)
        #[arg(long)]
        max: String,
        /// ASCII date token to skip; repeat or comma-separate for several
        #[arg(long)]
        exception: Vec<String>,
        /// Minutes east of UTC used for `...Z` tokens
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i32,
        /// Print a JSON array instead of one date per line
        #[arg(long)]
        json: bool,
    },
    /// Turn recurrence settings JSON into a rule string
    Serialize {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Minutes east of UTC used to write a floating UNTIL as `...Z`
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i32,
    },
    /// Decode an ASCII date token to wall-clock time
    Decode {
        /// Token in yyyyMMdd, yyyyMMddTHHmmss or yyyyMMddTHHmmssZ form
        token: String,
        /// Minutes east of UTC used for `...Z` tokens
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i32,
    },
    /// Encode wall-clock time as an ASCII date token
    Encode {
        /// Date-time (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
        datetime: String,
        /// Minutes east of UTC
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i32,
        /// Write a floating token without the `Z` suffix
        #[arg(long)]
        local: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { rule } => match recurrence_engine::parse_rule(&rule) {
            Ok(_) => println!("valid"),
            Err(err) => {
                println!("invalid: {}", err);
                process::exit(1);
            }
        },
        Commands::Expand {
            rule,
            start,
            end,
            min,
            max,
            exception,
            offset,
            json,
        } => {
            let mut request = GenerationRequest::new(
                rule,
                parse_datetime(&start)?,
                parse_datetime(&min)?,
                parse_datetime(&max)?,
            )
            .with_timezone_offset(offset);
            if let Some(end) = end {
                request = request.with_end(parse_datetime(&end)?);
            }
            if !exception.is_empty() {
                request = request.with_exception(exception.join(",").as_str());
            }

            let dates = recurrence_engine::try_generate_dates(&request, &FixedOffsetMinutes(offset))
                .context("Failed to expand rule")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dates)?);
            } else {
                for date in dates {
                    println!("{}", date.format("%Y-%m-%dT%H:%M:%S"));
                }
            }
        }
        Commands::Serialize { input, offset } => {
            let json = read_input(input.as_deref())?;
            let settings =
                RecurrenceSettings::from_json(&json).context("Failed to read recurrence settings")?;
            match recurrence_engine::serialize_rule(&settings, &FixedOffsetMinutes(offset))
                .context("Failed to serialize settings")?
            {
                Some(rule) => println!("{}", rule),
                None => bail!("Settings have no freq; nothing to serialize"),
            }
        }
        Commands::Decode { token, offset } => {
            let local = recurrence_engine::decode(&token, &FixedOffsetMinutes(offset))
                .with_context(|| format!("Failed to decode token: {}", token))?;
            println!("{}", local.format("%Y-%m-%dT%H:%M:%S"));
        }
        Commands::Encode {
            datetime,
            offset,
            local,
        } => {
            let dt = parse_datetime(&datetime)?;
            let token = if local {
                recurrence_engine::encode_local(dt)
            } else {
                recurrence_engine::encode(dt, &FixedOffsetMinutes(offset))
            }
            .with_context(|| format!("Failed to encode date-time: {}", datetime))?;
            println!("{}", token);
        }
    }

    Ok(())
}

/// Parse `YYYY-MM-DDTHH:MM:SS`, or `YYYY-MM-DD` as midnight.
fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
        .with_context(|| format!("Invalid date-time '{}': expected YYYY-MM-DD[THH:MM:SS]", s))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
