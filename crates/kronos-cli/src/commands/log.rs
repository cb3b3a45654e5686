//! Log command

use crate::context::{metadata, parse_meta, read_record, CliResult, GlobalArgs};
use clap::{Args, ValueEnum};
use kronos_core::ChangeKind;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Created,
    Updated,
    Deleted,
}

impl From<KindArg> for ChangeKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Created => ChangeKind::Created,
            KindArg::Updated => ChangeKind::Updated,
            KindArg::Deleted => ChangeKind::Deleted,
        }
    }
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Entity type name
    #[arg(long = "type")]
    pub entity_type: String,

    /// Entity state (JSON object file, `-` for stdin)
    pub file: PathBuf,

    /// What happened to the entity
    #[arg(long, value_enum, default_value = "updated")]
    pub kind: KindArg,

    /// Metadata recorded with the change, as key=value
    #[arg(long = "meta", value_parser = parse_meta)]
    pub meta: Vec<(String, kronos_core::Value)>,
}

pub fn execute(global: &GlobalArgs, args: LogArgs) -> CliResult {
    let record = read_record(&args.entity_type, &args.file)?;
    let tracker = global.tracker()?;
    let key = tracker.entity_key(&record)?;

    let outcome = tracker.log_changes(&record, args.kind.into(), &metadata(args.meta))?;

    match outcome {
        None if matches!(args.kind, KindArg::Deleted) => println!("Logged deletion: {}", key),
        None => println!("Not tracked: {}", key),
        Some(diff) if diff.is_empty() => println!("No changes: {}", key),
        Some(diff) => {
            println!("Logged changes: {}", key);
            println!("{}", serde_json::to_string_pretty(&diff.to_log_safe())?);
        }
    }

    Ok(())
}
