//! Track command

use crate::context::{read_record, CliResult, GlobalArgs};
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct TrackArgs {
    /// Entity type name
    #[arg(long = "type")]
    pub entity_type: String,

    /// Entity state (JSON object file, `-` for stdin)
    pub file: PathBuf,

    /// Replace a diverging snapshot instead of failing with a conflict
    #[arg(long)]
    pub overwrite: bool,
}

pub fn execute(global: &GlobalArgs, args: TrackArgs) -> CliResult {
    let record = read_record(&args.entity_type, &args.file)?;
    let tracker = global.tracker()?;

    tracker.track_entity(&record, args.overwrite)?;

    println!("Tracked: {}", tracker.entity_key(&record)?);
    Ok(())
}
