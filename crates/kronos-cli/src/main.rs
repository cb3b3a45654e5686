//! Kronos CLI
//!
//! Command-line interface for diffing and tracking entity states

use clap::{Parser, Subcommand};
use kronos_core::errors::{ExError, KronosError};
use kronos_core::logging_facility::{self, Profile};

mod commands;
mod context;

#[derive(Debug, Parser)]
#[command(name = "kronos")]
#[command(about = "Kronos - entity change tracking", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: context::GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Structural diff of two JSON documents
    Diff(commands::diff::DiffArgs),
    /// Store a snapshot of an entity
    Track(commands::track::TrackArgs),
    /// Diff an entity against its snapshot and record the change
    Log(commands::log::LogArgs),
    /// Show logged changes for an entity type
    History(commands::history::HistoryArgs),
    /// Print the snapshot key of an entity
    Key(commands::key::KeyArgs),
}

fn main() {
    let cli = Cli::parse();

    logging_facility::init(if cli.global.verbose {
        Profile::Development
    } else {
        Profile::Production
    });

    let result = match cli.command {
        Commands::Diff(args) => commands::diff::execute(&cli.global, args),
        Commands::Track(args) => commands::track::execute(&cli.global, args),
        Commands::Log(args) => commands::log::execute(&cli.global, args),
        Commands::History(args) => commands::history::execute(&cli.global, args),
        Commands::Key(args) => commands::key::execute(&cli.global, args),
    };

    if let Err(e) = result {
        match e.downcast::<KronosError>() {
            Ok(err) => eprintln!("Error: {}", ExError::from(*err)),
            Err(other) => eprintln!("Error: {}", other),
        }
        std::process::exit(1);
    }
}
