//! Key command

use crate::context::{read_record, CliResult, GlobalArgs};
use clap::Args;
use kronos_core::{EntityNormalizer, SnapshotStore, Tracker};
use kronos_store::FsSnapshotStore;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct KeyArgs {
    /// Entity type name
    #[arg(long = "type")]
    pub entity_type: String,

    /// Entity state (JSON object file, `-` for stdin)
    pub file: PathBuf,
}

pub fn execute(global: &GlobalArgs, args: KeyArgs) -> CliResult {
    let record = read_record(&args.entity_type, &args.file)?;

    // Key derivation needs no change log, so none is opened.
    let tracker = Tracker::new(
        EntityNormalizer::new(global.tracker_config()?),
        FsSnapshotStore::new(&global.store_dir),
        kronos_core::MemoryChangeLog::new(),
    );
    let key = tracker.entity_key(&record)?;
    let tracked = tracker.store().has_key(&key)?;

    println!("{}", key);
    tracing::debug!(entity_key = %key, tracked, "resolved entity key");
    Ok(())
}
