//! Genesis block construction
//!
//! Every network shares one coinbase recipe and differs only in header time,
//! bits and nonce. The resulting hash and Merkle root are compared against
//! pinned constants; a mismatch means the binary disagrees with the rest of
//! the network about height 0.

use log::debug;

use super::{ChainParamsError, Network};
use crate::consensus::{Block, BlockHeader};
use crate::constants::{Amount, COIN};
use crate::crypto::Hash;
use crate::validation::{Script, Transaction, TxOutput, OP_CHECKSIG};

/// Headline embedded in the genesis coinbase
pub const GENESIS_TIMESTAMP_MESSAGE: &str =
    "The rulers of this most insecure of all worlds are rulers by accident.";

/// Uncompressed key the genesis output pays to
pub const GENESIS_OUTPUT_PUBKEY: &str = "04becedf6ebadd4596964d890f677f8d2e74fdcc313c6416434384a66d6d8758d1c92de272dc6713e4a81d98841dfdfdc95e204ba915447d2fe9313435c78af3e8";

/// Genesis coinbase value
pub const GENESIS_REWARD: Amount = 16 * COIN;

/// Merkle root of the genesis coinbase (identical on every network)
pub const GENESIS_MERKLE_ROOT: &str = "11f8d6fdf5460c2308b76da69942dd9fa386f9d337fbc95f669d73bcf02b64a5";

pub const MAIN_GENESIS_HASH: &str = "9769f9ac9d0e001694b65a28e88963dad8ff825a2c5e3600bb2b9e71097d4f66";
pub const TEST_GENESIS_HASH: &str = "2385c1398aca1a618f05f848b024d5ae9e63d56e4898aaa59110e6ec48cbb5fe";
pub const REGTEST_GENESIS_HASH: &str = "62dddca3851c58fae88ed0ceba2ca841f82e7b48b94f626f7130e3ce9da42717";

/// Bits value that starts the coinbase script
const GENESIS_SCRIPT_BITS: i64 = 486604799;

/// Header fields and pinned results for one network's genesis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisSpec {
    pub version: i32,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
    pub reward: Amount,
    /// Display-order hex of the expected block hash
    pub expected_hash: &'static str,
    /// Display-order hex of the expected Merkle root, when pinned
    pub expected_merkle_root: Option<&'static str>,
}

impl GenesisSpec {
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Main => Self {
                version: 1,
                timestamp: 1503332100,
                bits: 0x1e0fffff,
                nonce: 294622,
                reward: GENESIS_REWARD,
                expected_hash: MAIN_GENESIS_HASH,
                expected_merkle_root: Some(GENESIS_MERKLE_ROOT),
            },
            Network::Test => Self {
                timestamp: 1503324223,
                nonce: 1088722,
                expected_hash: TEST_GENESIS_HASH,
                ..Self::for_network(Network::Main)
            },
            Network::Regression => Self {
                bits: 0x207fffff,
                nonce: 1,
                expected_hash: REGTEST_GENESIS_HASH,
                ..Self::for_network(Network::Test)
            },
        }
    }

    /// Build the block described by this recipe without checking it
    pub fn block(&self) -> Block {
        create_genesis_block(self.timestamp, self.nonce, self.bits, self.version, self.reward)
    }
}

/// The genesis coinbase transaction
pub fn genesis_coinbase(reward: Amount) -> Transaction {
    let pubkey = hex::decode(GENESIS_OUTPUT_PUBKEY).unwrap_or_default();

    let script_sig = Script::new()
        .push_int(GENESIS_SCRIPT_BITS)
        .push_script_num(4)
        .push_slice(GENESIS_TIMESTAMP_MESSAGE.as_bytes());
    let script_pubkey = Script::new().push_slice(&pubkey).push_opcode(OP_CHECKSIG);

    Transaction::coinbase(
        script_sig,
        vec![TxOutput {
            value: reward,
            script_pubkey,
        }],
    )
}

/// Create a genesis block from header fields
///
/// Deterministic: the same arguments always produce byte-identical blocks.
pub fn create_genesis_block(timestamp: u32, nonce: u32, bits: u32, version: i32, reward: Amount) -> Block {
    let mut block = Block::new(
        BlockHeader::new(version, Hash::zero(), Hash::zero(), timestamp, bits, nonce),
        vec![genesis_coinbase(reward)],
    );
    block.header.merkle_root = block.build_merkle_root().0;
    block
}

/// Build the genesis block and check it against the pinned constants
pub fn build_genesis(spec: &GenesisSpec) -> Result<Block, ChainParamsError> {
    let block = spec.block();

    if let Some(expected) = spec.expected_merkle_root {
        let actual = block.header.merkle_root.to_hex();
        if actual != expected {
            return Err(ChainParamsError::MerkleRootMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
    }

    let actual = block.hash().to_hex();
    if actual != spec.expected_hash {
        return Err(ChainParamsError::GenesisMismatch {
            expected: spec.expected_hash.to_string(),
            actual,
        });
    }

    debug!("genesis {} verified (nonce {})", actual, spec.nonce);
    Ok(block)
}
