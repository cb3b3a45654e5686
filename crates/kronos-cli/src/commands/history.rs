//! History command

use crate::context::{CliResult, GlobalArgs};
use chrono::{DateTime, Utc};
use clap::Args;
use kronos_core::{ChangeLogger, HistoryQuery};

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Entity type name
    #[arg(long = "type")]
    pub entity_type: String,

    /// Maximum number of entries
    #[arg(long)]
    pub limit: Option<usize>,

    /// Earliest timestamp, inclusive (RFC 3339)
    #[arg(long)]
    pub since: Option<DateTime<Utc>>,

    /// Latest timestamp, exclusive (RFC 3339)
    #[arg(long)]
    pub until: Option<DateTime<Utc>>,

    /// List the oldest entries first
    #[arg(long)]
    pub oldest_first: bool,
}

impl HistoryArgs {
    fn query(&self) -> HistoryQuery {
        let mut query = HistoryQuery::new();
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(since) = self.since {
            query = query.since(since);
        }
        if let Some(until) = self.until {
            query = query.until(until);
        }
        if self.oldest_first {
            query = query.oldest_first();
        }
        query
    }
}

/// Prints one JSON object per entry.
pub fn execute(global: &GlobalArgs, args: HistoryArgs) -> CliResult {
    let log = global.change_log()?;

    for entry in log.history(&args.entity_type, &args.query())? {
        println!("{}", serde_json::to_string(&entry)?);
    }

    Ok(())
}
