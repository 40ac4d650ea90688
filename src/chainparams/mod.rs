//! Chain parameters - per-network constants, genesis blocks, seeds and selection

mod network;
mod params;
mod selector;
pub mod genesis;
pub mod seeds;

pub use network::*;
pub use params::*;
pub use selector::*;
pub use genesis::{create_genesis_block, GenesisSpec};
pub use seeds::{DnsSeed, SeedAddress};
