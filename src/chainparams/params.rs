//! Per-network parameter sets
//!
//! Each network's constants live in one immutable [`ChainParams`] built on
//! first use. Test starts from Main and overrides what differs; Regression
//! starts from Test the same way.

use log::{debug, error};
use num_bigint::BigUint;
use num_traits::One;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::genesis::{build_genesis, GenesisSpec};
use super::seeds::{convert_seeds, unix_now, DnsSeed, SeedAddress, MAIN_FIXED_SEEDS};
use super::Network;
use crate::consensus::{hash_to_target, target_to_compact, target_to_hash, Block};
use crate::crypto::random::InsecureRand;
use crate::crypto::{hash_bytes, Hash, PublicKey, SignatureError};

/// Testnet alert key (uncompressed secp256k1)
const TEST_ALERT_PUBKEY: &str = "040d3090a194381599d0f53f89ec60b9ec77f0e7b61978ef445142c8a4f1e154ca3441a5e46e12910540352edbd8af43fc1ee1da9a935c1c252fe7426c323d3d32";

/// Errors while constructing a parameter set
#[derive(Debug, Error, PartialEq)]
pub enum ChainParamsError {
    #[error("genesis hash mismatch: expected {expected}, computed {actual}")]
    GenesisMismatch { expected: String, actual: String },
    #[error("genesis merkle root mismatch: expected {expected}, computed {actual}")]
    MerkleRootMismatch { expected: String, actual: String },
    #[error("invalid alert key constant: {0}")]
    InvalidAlertKey(#[from] hex::FromHexError),
}

/// Errors verifying a network alert
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlertError {
    #[error("alerts are disabled on this network")]
    Disabled,
    #[error("alert signature rejected: {0}")]
    Signature(#[from] SignatureError),
}

/// Height-gated rule changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ForkId {
    /// Masternodes must announce the network's default port
    MasternodePort,
    /// Masternodes receive a fifth of the block value
    Reward1,
    /// Masternodes receive two fifths of the block value
    Reward2,
}

impl ForkId {
    pub const ALL: [ForkId; 3] = [ForkId::MasternodePort, ForkId::Reward1, ForkId::Reward2];

    pub fn name(&self) -> &'static str {
        match self {
            ForkId::MasternodePort => "masternode_port",
            ForkId::Reward1 => "reward1",
            ForkId::Reward2 => "reward2",
        }
    }
}

/// Base58 address and key kinds with a per-network version prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Base58Type {
    PubkeyAddress,
    ScriptAddress,
    SecretKey,
    ExtPublicKey,
    ExtSecretKey,
    /// BIP44 coin type; not an encoding prefix
    ExtCoinType,
}

impl Base58Type {
    pub const ALL: [Base58Type; 6] = [
        Base58Type::PubkeyAddress,
        Base58Type::ScriptAddress,
        Base58Type::SecretKey,
        Base58Type::ExtPublicKey,
        Base58Type::ExtSecretKey,
        Base58Type::ExtCoinType,
    ];

    /// Kinds that appear at the front of encoded strings
    pub const ENCODABLE: [Base58Type; 5] = [
        Base58Type::PubkeyAddress,
        Base58Type::ScriptAddress,
        Base58Type::SecretKey,
        Base58Type::ExtPublicKey,
        Base58Type::ExtSecretKey,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Base58Type::PubkeyAddress => "pubkey_address",
            Base58Type::ScriptAddress => "script_address",
            Base58Type::SecretKey => "secret_key",
            Base58Type::ExtPublicKey => "ext_public_key",
            Base58Type::ExtSecretKey => "ext_secret_key",
            Base58Type::ExtCoinType => "ext_coin_type",
        }
    }
}

/// Immutable protocol constants of one network
#[derive(Debug, Clone)]
pub struct ChainParams {
    network: Network,
    message_start: [u8; 4],
    alert_pubkey: Vec<u8>,
    default_port: u16,
    rpc_port: u16,
    /// Easiest allowed target, stored in hash byte order
    pow_limit: Hash,
    subsidy_halving_interval: u64,
    fork_heights: BTreeMap<ForkId, u64>,
    genesis: Block,
    genesis_hash: Hash,
    base58_prefixes: [Vec<u8>; 6],
    dns_seeds: Vec<DnsSeed>,
    fixed_seeds: Vec<SeedAddress>,
    data_dir: &'static str,
    require_rpc_password: bool,
}

/// Serializable overview of a parameter set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsSummary {
    pub network: Network,
    pub message_start: String,
    pub default_port: u16,
    pub rpc_port: u16,
    pub pow_limit_bits: String,
    pub subsidy_halving_interval: u64,
    pub fork_heights: BTreeMap<String, u64>,
    pub genesis_hash: String,
    pub genesis_merkle_root: String,
    pub base58_prefixes: BTreeMap<String, String>,
    pub dns_seeds: Vec<String>,
    pub fixed_seeds: Vec<String>,
    pub data_dir: String,
    pub require_rpc_password: bool,
    pub alerts_enabled: bool,
}

/// `2^256 - 1` shifted right by `bits`
fn pow_limit_shifted(bits: usize) -> Hash {
    let max = (BigUint::one() << 256usize) - BigUint::one();
    target_to_hash(&(max >> bits))
}

fn fork_table(masternode_port: u64, reward1: u64, reward2: u64) -> BTreeMap<ForkId, u64> {
    BTreeMap::from([
        (ForkId::MasternodePort, masternode_port),
        (ForkId::Reward1, reward1),
        (ForkId::Reward2, reward2),
    ])
}

fn prefix_table(pubkey: u8, script: u8, secret: u8, ext_public: u32, ext_secret: u32, coin_type: u32) -> [Vec<u8>; 6] {
    [
        vec![pubkey],
        vec![script],
        vec![secret],
        ext_public.to_be_bytes().to_vec(),
        ext_secret.to_be_bytes().to_vec(),
        coin_type.to_be_bytes().to_vec(),
    ]
}

fn main_definition(genesis: &GenesisSpec) -> Result<ChainParams, ChainParamsError> {
    let genesis = build_genesis(genesis)?;
    let default_port = 55675;
    let mut rng = InsecureRand::randomized();

    Ok(ChainParams {
        network: Network::Main,
        message_start: [0x08, 0x02, 0x01, 0x17],
        alert_pubkey: Vec::new(),
        default_port,
        rpc_port: 55680,
        pow_limit: pow_limit_shifted(20),
        subsidy_halving_interval: 500_000,
        fork_heights: fork_table(100, 10_000, 250_000),
        genesis_hash: genesis.hash(),
        genesis,
        base58_prefixes: prefix_table(0, 5, 128 + 28, 0x02FE_52F8, 0x02FE_52CC, 0x8000_0005),
        dns_seeds: (1..=5)
            .map(|i| {
                let host = format!("seed{}.interzone.space", i);
                DnsSeed::new(&host, &host)
            })
            .collect(),
        fixed_seeds: convert_seeds(MAIN_FIXED_SEEDS, default_port, unix_now(), &mut rng),
        data_dir: "",
        require_rpc_password: true,
    })
}

fn test_definition(genesis: &GenesisSpec) -> Result<ChainParams, ChainParamsError> {
    let genesis = build_genesis(genesis)?;

    Ok(ChainParams {
        network: Network::Test,
        message_start: [0xfb, 0xc2, 0x11, 0x02],
        alert_pubkey: hex::decode(TEST_ALERT_PUBKEY)?,
        default_port: 21817,
        rpc_port: 21818,
        fork_heights: fork_table(100, 250, 500),
        genesis_hash: genesis.hash(),
        genesis,
        base58_prefixes: prefix_table(102, 44, 128 + 88, 0x3A80_61A0, 0x3A80_5837, 0x8000_0001),
        dns_seeds: vec![DnsSeed::new("seed1.interzone.space", "seed1.interzone.space")],
        fixed_seeds: Vec::new(),
        data_dir: "secretnetwork",
        ..main_definition(&GenesisSpec::for_network(Network::Main))?
    })
}

fn regtest_definition(genesis: &GenesisSpec) -> Result<ChainParams, ChainParamsError> {
    let genesis = build_genesis(genesis)?;

    Ok(ChainParams {
        network: Network::Regression,
        message_start: [0xfc, 0x1f, 0xc3, 0x56],
        default_port: 21819,
        pow_limit: pow_limit_shifted(1),
        subsidy_halving_interval: 150,
        genesis_hash: genesis.hash(),
        genesis,
        dns_seeds: Vec::new(),
        fixed_seeds: Vec::new(),
        data_dir: "regression",
        require_rpc_password: false,
        ..test_definition(&GenesisSpec::for_network(Network::Test))?
    })
}

impl ChainParams {
    /// Build the parameter set of `network`, checking its genesis
    pub fn try_build(network: Network) -> Result<Self, ChainParamsError> {
        Self::try_build_with_genesis(network, &GenesisSpec::for_network(network))
    }

    /// Build `network` with an explicit genesis recipe
    ///
    /// Inherited parents are always built from their own recipes.
    pub fn try_build_with_genesis(network: Network, genesis: &GenesisSpec) -> Result<Self, ChainParamsError> {
        let params = match network {
            Network::Main => main_definition(genesis)?,
            Network::Test => test_definition(genesis)?,
            Network::Regression => regtest_definition(genesis)?,
        };
        debug!(
            "{} parameters built: genesis {}, magic {}",
            network,
            params.genesis_hash,
            hex::encode(params.message_start)
        );
        Ok(params)
    }

    /// Build `network`, treating any integrity failure as fatal
    ///
    /// A node whose genesis disagrees with the pinned constant must not run.
    pub fn build(network: Network) -> Self {
        Self::build_with_genesis(network, &GenesisSpec::for_network(network))
    }

    /// [`ChainParams::build`] with an explicit genesis recipe
    pub fn build_with_genesis(network: Network, genesis: &GenesisSpec) -> Self {
        match Self::try_build_with_genesis(network, genesis) {
            Ok(params) => params,
            Err(err) => {
                error!("{} parameters failed integrity check: {}", network, err);
                panic!("{} parameters failed integrity check: {}", network, err);
            }
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// P2P message start bytes
    pub fn message_start(&self) -> [u8; 4] {
        self.message_start
    }

    /// Alert key bytes; empty when alerts are disabled
    pub fn alert_pubkey(&self) -> &[u8] {
        &self.alert_pubkey
    }

    pub fn default_port(&self) -> u16 {
        self.default_port
    }

    pub fn rpc_port(&self) -> u16 {
        self.rpc_port
    }

    /// Easiest target, in hash byte order
    pub fn pow_limit(&self) -> &Hash {
        &self.pow_limit
    }

    /// Easiest target as an integer
    pub fn pow_limit_target(&self) -> BigUint {
        hash_to_target(&self.pow_limit)
    }

    pub fn subsidy_halving_interval(&self) -> u64 {
        self.subsidy_halving_interval
    }

    /// Activation height of `fork`
    pub fn fork_height(&self, fork: ForkId) -> u64 {
        self.fork_heights.get(&fork).copied().unwrap_or(u64::MAX)
    }

    /// Fork activation heights in fork order
    pub fn fork_heights(&self) -> &BTreeMap<ForkId, u64> {
        &self.fork_heights
    }

    pub fn is_fork_active(&self, fork: ForkId, height: u64) -> bool {
        height >= self.fork_height(fork)
    }

    pub fn genesis_block(&self) -> &Block {
        &self.genesis
    }

    pub fn genesis_hash(&self) -> Hash {
        self.genesis_hash
    }

    pub fn base58_prefix(&self, kind: Base58Type) -> &[u8] {
        &self.base58_prefixes[kind.index()]
    }

    pub fn dns_seeds(&self) -> &[DnsSeed] {
        &self.dns_seeds
    }

    pub fn fixed_seeds(&self) -> &[SeedAddress] {
        &self.fixed_seeds
    }

    /// Sub-directory of the data directory, empty for Main
    pub fn data_dir(&self) -> &str {
        self.data_dir
    }

    pub fn require_rpc_password(&self) -> bool {
        self.require_rpc_password
    }

    pub fn alerts_enabled(&self) -> bool {
        !self.alert_pubkey.is_empty()
    }

    /// Verify a DER signature over the double SHA-256 of an alert payload
    pub fn verify_alert(&self, payload: &[u8], der_signature: &[u8]) -> Result<(), AlertError> {
        if !self.alerts_enabled() {
            return Err(AlertError::Disabled);
        }
        verify_alert_signature(&self.alert_pubkey, payload, der_signature)
    }

    pub fn summary(&self) -> ParamsSummary {
        ParamsSummary {
            network: self.network,
            message_start: hex::encode(self.message_start),
            default_port: self.default_port,
            rpc_port: self.rpc_port,
            pow_limit_bits: format!("0x{:08x}", target_to_compact(&self.pow_limit_target())),
            subsidy_halving_interval: self.subsidy_halving_interval,
            fork_heights: self
                .fork_heights
                .iter()
                .map(|(fork, height)| (fork.name().to_string(), *height))
                .collect(),
            genesis_hash: self.genesis_hash.to_hex(),
            genesis_merkle_root: self.genesis.header.merkle_root.to_hex(),
            base58_prefixes: Base58Type::ALL
                .iter()
                .map(|kind| (kind.name().to_string(), hex::encode(self.base58_prefix(*kind))))
                .collect(),
            dns_seeds: self.dns_seeds.iter().map(|seed| seed.host.clone()).collect(),
            fixed_seeds: self.fixed_seeds.iter().map(|seed| seed.addr.to_string()).collect(),
            data_dir: self.data_dir.to_string(),
            require_rpc_password: self.require_rpc_password,
            alerts_enabled: self.alerts_enabled(),
        }
    }
}

/// Verify an alert against an explicit SEC1 key
pub fn verify_alert_signature(pubkey: &[u8], payload: &[u8], der_signature: &[u8]) -> Result<(), AlertError> {
    let key = PublicKey::from_sec1(pubkey)?;
    key.verify(&hash_bytes(payload), der_signature)?;
    Ok(())
}

static MAIN_PARAMS: Lazy<ChainParams> = Lazy::new(|| ChainParams::build(Network::Main));
static TEST_PARAMS: Lazy<ChainParams> = Lazy::new(|| ChainParams::build(Network::Test));
static REGTEST_PARAMS: Lazy<ChainParams> = Lazy::new(|| ChainParams::build(Network::Regression));

pub fn main_params() -> &'static ChainParams {
    &MAIN_PARAMS
}

pub fn testnet_params() -> &'static ChainParams {
    &TEST_PARAMS
}

pub fn regtest_params() -> &'static ChainParams {
    &REGTEST_PARAMS
}

/// The static parameter set of `network`
pub fn network_params(network: Network) -> &'static ChainParams {
    match network {
        Network::Main => main_params(),
        Network::Test => testnet_params(),
        Network::Regression => regtest_params(),
    }
}
