//! Active network selection
//!
//! A selector points at one of the three static parameter sets. Selection
//! happens during startup; once the node starts consensus activity the
//! selector is frozen and every later read sees the same set.

use log::{info, warn};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use thiserror::Error;

use super::{network_params, ChainParams, Network};
use crate::config::{ConfigError, NetworkFlags};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("network selection is frozen on {active}")]
    Frozen { active: Network },
}

/// Read-mostly handle on the active parameter set
#[derive(Debug)]
pub struct ParameterSelector {
    active: AtomicU8,
    frozen: AtomicBool,
}

impl ParameterSelector {
    /// Selector starting on Main
    pub const fn new() -> Self {
        Self {
            active: AtomicU8::new(Network::Main as u8),
            frozen: AtomicBool::new(false),
        }
    }

    pub fn active_network(&self) -> Network {
        let raw = self.active.load(Ordering::Acquire);
        match Network::from_u8(raw) {
            Some(network) => network,
            None => unreachable!("selector holds unknown network {}", raw),
        }
    }

    /// The active parameter set; Main until something else is selected
    pub fn active(&self) -> &'static ChainParams {
        network_params(self.active_network())
    }

    /// Install `network` as the active set
    ///
    /// Builds the set first, so a genesis failure aborts before anything
    /// observes the switch.
    pub fn select(&self, network: Network) -> Result<&'static ChainParams, SelectionError> {
        if self.is_frozen() {
            let active = self.active_network();
            warn!("ignoring selection of {}: frozen on {}", network, active);
            return Err(SelectionError::Frozen { active });
        }

        let params = network_params(network);
        self.active.store(network.as_u8(), Ordering::Release);
        info!("selected {} network parameters", network);
        Ok(params)
    }

    /// Select from the testnet/regtest flags
    ///
    /// Conflicting flags leave the current selection untouched.
    pub fn select_from_configuration(&self, flags: &NetworkFlags) -> Result<Network, ConfigError> {
        let network = flags.network()?;
        self.select(network)?;
        Ok(network)
    }

    /// Forbid further selection
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }
}

impl Default for ParameterSelector {
    fn default() -> Self {
        Self::new()
    }
}

static SELECTOR: ParameterSelector = ParameterSelector::new();

/// The process-wide selector
pub fn selector() -> &'static ParameterSelector {
    &SELECTOR
}

/// Parameters of the process-wide active network
pub fn params() -> &'static ChainParams {
    SELECTOR.active()
}

pub fn select_params(network: Network) -> Result<&'static ChainParams, SelectionError> {
    SELECTOR.select(network)
}

pub fn select_params_from_flags(flags: &NetworkFlags) -> Result<Network, ConfigError> {
    SELECTOR.select_from_configuration(flags)
}

/// Freeze the process-wide selection
pub fn freeze_params() {
    SELECTOR.freeze();
}
