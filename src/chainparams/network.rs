//! Network identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the three parameter sets a node can run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production network
    Main = 0,
    /// Public test network
    Test = 1,
    /// Local regression-test network with trivial difficulty
    #[serde(rename = "regtest")]
    Regression = 2,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Main, Network::Test, Network::Regression];

    /// Short name used on the command line and in logs
    pub fn name(&self) -> &'static str {
        match self {
            Network::Main => "main",
            Network::Test => "test",
            Network::Regression => "regtest",
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Network::as_u8`]; `None` for unknown discriminants
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Network::Main),
            1 => Some(Network::Test),
            2 => Some(Network::Regression),
            _ => None,
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Network::Main
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown network '{0}'")]
pub struct ParseNetworkError(pub String);

impl FromStr for Network {
    type Err = ParseNetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "main" | "mainnet" => Ok(Network::Main),
            "test" | "testnet" => Ok(Network::Test),
            "regtest" | "regression" => Ok(Network::Regression),
            _ => Err(ParseNetworkError(s.to_string())),
        }
    }
}
