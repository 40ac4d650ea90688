//! Seed node configuration
//!
//! Bootstrap peers a fresh node tries before it has learned any addresses:
//! DNS seeds resolved at connect time and hardcoded IPv4 fixed seeds.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::crypto::random::InsecureRand;

/// One week in seconds
pub const ONE_WEEK: u64 = 7 * 24 * 60 * 60;

/// Mainnet fixed seeds in `in_addr` byte order
pub const MAIN_FIXED_SEEDS: &[u32] = &[0x1234_5678];

/// A DNS seed: display name and host to resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsSeed {
    pub name: String,
    pub host: String,
}

impl DnsSeed {
    pub fn new(name: &str, host: &str) -> Self {
        Self {
            name: name.to_string(),
            host: host.to_string(),
        }
    }
}

/// A fixed seed with the last-seen time peers are told about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedAddress {
    pub addr: SocketAddrV4,
    /// Seconds since the Unix epoch
    pub last_seen: u64,
}

/// Decode a raw seed: the low byte of `raw` is the first octet
pub fn seed_ipv4(raw: u32) -> Ipv4Addr {
    Ipv4Addr::from(raw.to_le_bytes())
}

/// Expand raw fixed seeds into addresses on `port`
///
/// Each address looks like it was seen in `[now - 2 weeks, now - 1 week)`,
/// so fixed seeds rank below freshly gossiped peers.
pub fn convert_seeds(raw: &[u32], port: u16, now: u64, rng: &mut InsecureRand) -> Vec<SeedAddress> {
    raw.iter()
        .map(|&ip| SeedAddress {
            addr: SocketAddrV4::new(seed_ipv4(ip), port),
            last_seen: now.saturating_sub(ONE_WEEK + 1 + rng.below(ONE_WEEK as u32) as u64),
        })
        .collect()
}

/// Current Unix time in seconds
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
