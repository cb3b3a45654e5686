//! Global options and the collaborators built from them

use clap::Args;
use kronos_core::{EntityNormalizer, Metadata, Record, Tracker, TrackerConfig, Value};
use kronos_store::{FsSnapshotStore, SqliteChangeLog};
use std::io::Read;
use std::path::{Path, PathBuf};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Tracker configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding entity snapshots
    #[arg(long, global = true, default_value = ".kronos/snapshots")]
    pub store_dir: PathBuf,

    /// Change log database
    #[arg(long, global = true, default_value = ".kronos/changes.db")]
    pub db: PathBuf,

    /// Human-readable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn tracker_config(&self) -> kronos_core::Result<TrackerConfig> {
        match &self.config {
            Some(path) => TrackerConfig::from_file(path),
            None => Ok(TrackerConfig::default()),
        }
    }

    pub fn tracker(&self) -> kronos_core::Result<Tracker<FsSnapshotStore, SqliteChangeLog>> {
        Ok(Tracker::new(
            EntityNormalizer::new(self.tracker_config()?),
            FsSnapshotStore::new(&self.store_dir),
            SqliteChangeLog::open(&self.db)?,
        ))
    }

    pub fn change_log(&self) -> kronos_core::Result<SqliteChangeLog> {
        SqliteChangeLog::open(&self.db)
    }
}

/// Read a JSON document from `path`, or stdin for `-`.
pub fn read_json(path: &Path) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?
    };
    Ok(serde_json::from_str(&text)?)
}

/// Read a JSON object as a record of `type_name`.
pub fn read_record(type_name: &str, path: &Path) -> Result<Record, Box<dyn std::error::Error>> {
    Ok(Record::from_json(type_name, read_json(path)?)?)
}

/// Parse a `key=value` metadata pair; the value is JSON when it parses as
/// JSON and a plain string otherwise.
pub fn parse_meta(pair: &str) -> Result<(String, Value), String> {
    let (key, raw) = pair
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", pair))?;
    if key.is_empty() {
        return Err(format!("empty metadata key in '{}'", pair));
    }
    let value = serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw));
    Ok((key.to_string(), value))
}

pub fn metadata(pairs: Vec<(String, Value)>) -> Metadata {
    pairs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meta_json_and_string() {
        assert_eq!(
            parse_meta("attempt=3").unwrap(),
            ("attempt".to_string(), Value::Int(3))
        );
        assert_eq!(
            parse_meta("user=admin").unwrap(),
            ("user".to_string(), Value::from("admin"))
        );
        assert_eq!(
            parse_meta("note=a=b").unwrap(),
            ("note".to_string(), Value::from("a=b"))
        );
    }

    #[test]
    fn test_parse_meta_rejects_malformed() {
        assert!(parse_meta("novalue").is_err());
        assert!(parse_meta("=x").is_err());
    }
}
