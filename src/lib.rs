//! Interzone (IZ) Consensus Core Library
//!
//! Network parameter sets for Main, Test and Regression, deterministic
//! genesis construction, the proof-of-work and reward rules, and the
//! process-wide selection of the active network.

pub mod address;
pub mod chainparams;
pub mod config;
pub mod consensus;
pub mod crypto;
pub mod encode;
pub mod mining;
pub mod validation;

/// Initialize logging from `RUST_LOG`, defaulting to `info`
pub fn init_logger() {
    init_logger_with(log::LevelFilter::Info);
}

/// Initialize logging at `level`; `RUST_LOG` still overrides it
pub fn init_logger_with(level: log::LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

/// Protocol constants - identical on every network
pub mod constants {
    /// Monetary amount in base units
    pub type Amount = i64;

    /// Base units per coin
    pub const COIN: Amount = 100_000_000;

    /// Upper bound on any single amount or sum of amounts
    pub const MAX_MONEY: Amount = 16_000_000 * COIN;

    /// Target block spacing in seconds
    pub const TARGET_SPACING: i64 = 150;

    /// Blocks per difficulty adjustment period
    pub const DIFFICULTY_ADJUSTMENT_INTERVAL: u64 = 576;

    /// Expected duration of one adjustment period in seconds
    pub const TARGET_TIMESPAN: i64 = DIFFICULTY_ADJUSTMENT_INTERVAL as i64 * TARGET_SPACING;

    /// Ticker used in logs and summaries
    pub const CHAIN_NAME: &str = "IZ";
}
