pub mod launch;
pub mod terminal;

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use launch::{process_launch_command, LaunchCommand};
use tracing::level_filters::LevelFilter;

use crate::{
    storage::{
        counters::{CounterStore, RaterState, NAMESPACE},
        preferences::FilePreferences,
    },
    utils::{
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
        time::{format_elapsed, millis_to_date},
    },
};

#[derive(Parser, Debug)]
#[command(name = "apprater", version, long_about = None)]
#[command(about = "Counts application launches and asks for a rating when it's time", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default $XDG_STATE_HOME/apprater or $HOME/.local/state/apprater"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Enable logging to the console")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Count one launch and show the rating dialog if it's time")]
    Launch {
        #[command(flatten)]
        command: LaunchCommand,
    },
    #[command(about = "Print the persisted rater state")]
    Status {},
    #[command(about = "Overwrite persisted values. Meant for testing the prompt")]
    Set {
        #[arg(long = "launch-count")]
        launch_count: Option<u64>,
        #[arg(long = "first-launch", help = "Milliseconds since epoch, 0 to forget")]
        first_launch: Option<i64>,
        #[arg(long)]
        dismissed: Option<bool>,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;

    match args.commands {
        Commands::Launch { command } => process_launch_command(&dir, command).await,
        Commands::Status {} => {
            let counters = open_counters(&dir)?;
            print_status(counters.snapshot())
        }
        Commands::Set {
            launch_count,
            first_launch,
            dismissed,
        } => {
            let mut counters = open_counters(&dir)?;
            if let Some(launch_count) = launch_count {
                counters.set_launch_count(launch_count);
            }
            if let Some(first_launch) = first_launch {
                counters.set_first_launch(first_launch);
            }
            if let Some(dismissed) = dismissed {
                counters.set_dismissed_permanently(dismissed);
            }
            print_status(counters.snapshot())
        }
    }
}

fn open_counters(dir: &Path) -> Result<CounterStore<FilePreferences>> {
    Ok(CounterStore::new(FilePreferences::open(dir, NAMESPACE)?))
}

fn print_status(state: RaterState) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&state)?);
    if let Some(date) = millis_to_date(state.first_launch) {
        println!(
            "First launch {} ({} ago)",
            date.to_rfc3339(),
            format_elapsed(date, Utc::now())
        );
    }
    Ok(())
}
