//! File-backed snapshot storage
//!
//! One JSON document per entity key, sharded by the SHA256 of the key and
//! written with temp→rename so readers never observe a partial snapshot.

mod sharding;
mod snapshot_store;

pub use sharding::shard_path;
pub use snapshot_store::FsSnapshotStore;
