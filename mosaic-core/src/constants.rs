/// Mosaic system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of representatives shown per cluster. The freeze contract
/// requires exactly this many at freeze time.
pub const REPRESENTATIVES_PER_CLUSTER: usize = 16;

/// Minimum member overlap for a frozen group to claim a cluster in a
/// new pass (half the representative count).
pub const FREEZE_MATCH_FLOOR: usize = REPRESENTATIVES_PER_CLUSTER / 2;

/// Name of the metadata subdirectory that scanners must skip.
pub const METADATA_DIR: &str = ".mosaic";

/// Maximum pause between producer batches, in milliseconds. Keeps the
/// presentation surface responsive while embedding runs.
pub const PRODUCER_YIELD_MS: u64 = 30;
