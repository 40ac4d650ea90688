//! Node configuration
//!
//! Settings come from the command line and an optional TOML file. A boolean
//! flag is on when either source enables it; the command line wins for
//! valued settings.

use clap::Parser;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::chainparams::{Network, SelectionError};

/// Default config file name inside the data directory
pub const CONFIG_FILE_NAME: &str = "interzone.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid combination of -regtest and -testnet")]
    ConflictingNetworkFlags,
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown log level '{0}'")]
    InvalidLogLevel(String),
}

/// Command line of the `interzoned` binary
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "interzoned", version, about = "Interzone consensus core node")]
pub struct Cli {
    /// Use the test network
    #[arg(long)]
    pub testnet: bool,

    /// Use the regression test network
    #[arg(long)]
    pub regtest: bool,

    /// Config file (default: <datadir>/interzone.toml)
    #[arg(long, value_name = "FILE")]
    pub conf: Option<PathBuf>,

    /// Data directory
    #[arg(long, value_name = "DIR")]
    pub datadir: Option<PathBuf>,

    /// Print the active network parameters as JSON and exit
    #[arg(long)]
    pub print_params: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    pub loglevel: Option<String>,
}

/// Contents of `interzone.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub testnet: bool,
    pub regtest: bool,
    pub loglevel: Option<String>,
    pub datadir: Option<PathBuf>,
}

impl ConfigFile {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

/// The two network-choosing flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkFlags {
    pub testnet: bool,
    pub regtest: bool,
}

impl NetworkFlags {
    /// Network named by the flags
    pub fn network(&self) -> Result<Network, ConfigError> {
        match (self.testnet, self.regtest) {
            (false, false) => Ok(Network::Main),
            (true, false) => Ok(Network::Test),
            (false, true) => Ok(Network::Regression),
            (true, true) => Err(ConfigError::ConflictingNetworkFlags),
        }
    }
}

/// Merged command line and file settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub flags: NetworkFlags,
    pub datadir: PathBuf,
    pub log_level: LevelFilter,
    pub print_params: bool,
    /// Config file that was read, if any
    pub config_file: Option<PathBuf>,
}

impl Settings {
    /// Merge the command line with a parsed config file
    pub fn merge(cli: &Cli, file: &ConfigFile) -> Result<Self, ConfigError> {
        let log_level = match cli.loglevel.as_ref().or(file.loglevel.as_ref()) {
            Some(level) => level
                .parse::<LevelFilter>()
                .map_err(|_| ConfigError::InvalidLogLevel(level.clone()))?,
            None => LevelFilter::Info,
        };

        Ok(Self {
            flags: NetworkFlags {
                testnet: cli.testnet || file.testnet,
                regtest: cli.regtest || file.regtest,
            },
            datadir: cli
                .datadir
                .clone()
                .or_else(|| file.datadir.clone())
                .unwrap_or_else(default_datadir),
            log_level,
            print_params: cli.print_params,
            config_file: None,
        })
    }

    /// Read the config file named by `cli` (or the default one) and merge
    ///
    /// Runs before logging is set up, so the file read is recorded in
    /// `config_file` for the caller to report.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let path = match &cli.conf {
            Some(path) => Some(path.clone()),
            None => {
                let base = cli.datadir.clone().unwrap_or_else(default_datadir);
                Some(base.join(CONFIG_FILE_NAME)).filter(|path| path.exists())
            }
        };
        let file = match &path {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        Ok(Self {
            config_file: path,
            ..Self::merge(cli, &file)?
        })
    }

    /// Data directory of `network`: the base directory plus its sub-directory
    pub fn network_datadir(&self, network_subdir: &str) -> PathBuf {
        if network_subdir.is_empty() {
            self.datadir.clone()
        } else {
            self.datadir.join(network_subdir)
        }
    }
}

/// `$HOME/.interzone`, or `.interzone` when no home is set
pub fn default_datadir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".interzone")
}
