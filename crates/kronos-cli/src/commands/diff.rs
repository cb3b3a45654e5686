//! Diff command

use crate::context::{metadata, parse_meta, read_json, CliResult, GlobalArgs};
use clap::Args;
use kronos_core::{CanonicalView, EntityNormalizer};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// New state (JSON object file, `-` for stdin)
    pub new: PathBuf,

    /// Old state (JSON object file)
    pub old: PathBuf,

    /// Identity field used to correlate list elements
    #[arg(long)]
    pub identity_field: Option<String>,

    /// Metadata attached to the diff, as key=value
    #[arg(long = "meta", value_parser = parse_meta)]
    pub meta: Vec<(String, kronos_core::Value)>,

    /// Exit with status 3 when the documents differ
    #[arg(long)]
    pub exit_code: bool,
}

pub fn execute(global: &GlobalArgs, args: DiffArgs) -> CliResult {
    let mut config = global.tracker_config()?;
    if let Some(field) = args.identity_field {
        config = config.with_identity_field(field);
        config.validate()?;
    }

    let new = CanonicalView::from_json(read_json(&args.new)?)?;
    let old = CanonicalView::from_json(read_json(&args.old)?)?;

    let normalizer = EntityNormalizer::new(config);
    let diff = normalizer.diff(&new, &old, &metadata(args.meta))?;

    println!("{}", serde_json::to_string_pretty(&diff.to_log_safe())?);

    if args.exit_code && !diff.is_empty() {
        std::process::exit(3);
    }

    Ok(())
}
