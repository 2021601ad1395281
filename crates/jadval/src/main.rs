use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

mod config;
mod controller;
mod data;
mod db;
mod error;
mod form;
mod geometry;
mod html;
mod index;
mod server;
mod store;
mod types;

use config::{Backend, Config};
use controller::ScheduleController;
use store::ScheduleStore;
use types::Day;

#[derive(Parser, Debug)]
#[command(name = "jadval")]
#[command(about = "Weekly lesson timetable with a web schedule grid")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding the lesson storage (overrides JADVAL_DATA_DIR)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage backend (overrides JADVAL_BACKEND)
    #[arg(long, value_enum, global = true)]
    backend: Option<Backend>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server (default)
    Serve {
        /// Port to listen on (overrides JADVAL_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the stored lessons
    List {
        /// Only lessons on this day (1 = Monday .. 6 = Saturday)
        #[arg(long)]
        day: Option<u8>,
    },

    /// Fill an empty schedule with the demo timetable
    Seed,

    /// Write all lessons to a JSON file
    Export {
        /// Destination file
        file: PathBuf,
    },
}

/// `RUST_LOG` when set, otherwise `--log-level`, with HTTP internals kept quiet
fn log_filter(log_level: &str) -> Result<EnvFilter> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level))
        .add_directive("hyper=warn".parse()?)
        .add_directive("tower_http=warn".parse()?);
    Ok(filter)
}

fn init_tracing(log_level: &str) -> Result<()> {
    fmt()
        .with_env_filter(log_filter(log_level)?)
        .with_target(false)
        .init();
    Ok(())
}

fn open_store(config: &Config) -> Result<ScheduleStore<Box<dyn data::Persistence>>> {
    let persistence = config.open_persistence()?;
    ScheduleStore::open(persistence).context("Failed to load lessons")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level)?;

    let mut config = Config::from_env()?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(backend) = args.backend {
        config.backend = backend;
    }

    match args.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            info!(
                data_dir = %config.data_dir.display(),
                backend = ?config.backend,
                "Loading lessons"
            );
            let store = open_store(&config)?;
            info!(count = store.list_all().len(), "Lessons loaded");
            let controller = ScheduleController::new(store, config.load_catalog()?, config.grid);
            server::serve(config.port, server::AppState::new(controller)).await?;
        }
        Commands::List { day } => {
            let store = open_store(&config)?;
            let days = match day {
                Some(n) => {
                    vec![Day::new(n).with_context(|| format!("Invalid day {} (expected 1-6)", n))?]
                }
                None => Day::ALL.to_vec(),
            };
            for day in days {
                for lesson in index::sorted_for_day(store.list_all(), day) {
                    info!(
                        id = lesson.id,
                        day = day.short_name(),
                        start = %lesson.start_time,
                        end = %lesson.end_time,
                        title = %lesson.title,
                        teacher = %lesson.teacher,
                        room = %lesson.room,
                        "Lesson"
                    );
                }
            }
        }
        Commands::Seed => {
            let mut store = open_store(&config)?;
            if !store.list_all().is_empty() {
                warn!(
                    count = store.list_all().len(),
                    "Schedule already has lessons, not seeding"
                );
                return Ok(());
            }
            let drafts = data::demo_timetable()?;
            let total = drafts.len();
            for draft in drafts {
                store.create(draft)?;
            }
            info!(count = total, "Demo timetable inserted");
        }
        Commands::Export { file } => {
            let store = open_store(&config)?;
            data::save_json(store.list_all(), &file)?;
            info!(
                count = store.list_all().len(),
                path = %file.display(),
                "Lessons exported"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_keeps_http_crates_quiet() {
        let filter = log_filter("debug").unwrap().to_string();
        assert!(filter.contains("hyper=warn"));
        assert!(filter.contains("tower_http=warn"));
    }

    #[test]
    fn test_args_parse_global_overrides() {
        let args = Args::parse_from([
            "jadval",
            "list",
            "--day",
            "2",
            "--backend",
            "json",
            "--data-dir",
            "/tmp/jadval",
        ]);

        assert_eq!(args.backend, Some(Backend::Json));
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/jadval")));
        assert!(matches!(args.command, Some(Commands::List { day: Some(2) })));
    }
}
