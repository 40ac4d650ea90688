//! Transaction structure
//!
//! Bitcoin-style transactions in consensus serialization. The node's full
//! script and signature checks live outside this crate; here transactions are
//! built, serialized, hashed and sanity-checked.

use serde::{Deserialize, Serialize};
use crate::constants::{Amount, MAX_MONEY};
use crate::crypto::{hash_bytes, Hash};
use crate::encode::{write_compact_size, write_var_bytes};
use super::Script;

/// Reference to an output of an earlier transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Hash of the transaction containing the output
    pub txid: Hash,
    /// Index of the output in that transaction
    pub vout: u32,
}

impl OutPoint {
    /// The null outpoint spent by coinbase inputs
    pub const fn null() -> Self {
        Self {
            txid: Hash::zero(),
            vout: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        self.txid.is_zero() && self.vout == u32::MAX
    }
}

/// A transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub prevout: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
}

/// A transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Amount in base units
    pub value: Amount,
    pub script_pubkey: Script,
}

/// A complete transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// Lock time (block height or timestamp)
    pub lock_time: u32,
}

impl Transaction {
    /// Create a version 1 transaction with zero lock time
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        Self {
            version: 1,
            inputs,
            outputs,
            lock_time: 0,
        }
    }

    /// Create a coinbase transaction spending the null outpoint
    pub fn coinbase(script_sig: Script, outputs: Vec<TxOutput>) -> Self {
        Self::new(
            vec![TxInput {
                prevout: OutPoint::null(),
                script_sig,
                sequence: u32::MAX,
            }],
            outputs,
        )
    }

    /// Check if this is a coinbase transaction
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }

    /// Calculate transaction hash (txid)
    pub fn hash(&self) -> Hash {
        hash_bytes(&self.to_bytes())
    }

    /// Sum of output values, `None` if any value or the running sum leaves
    /// the money range
    pub fn value_out(&self) -> Option<Amount> {
        let mut total: Amount = 0;
        for output in &self.outputs {
            if !money_range(output.value) {
                return None;
            }
            total = total.checked_add(output.value)?;
            if !money_range(total) {
                return None;
            }
        }
        Some(total)
    }

    /// Consensus serialization
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();

        bytes.extend_from_slice(&self.version.to_le_bytes());

        write_compact_size(&mut bytes, self.inputs.len() as u64);
        for input in &self.inputs {
            bytes.extend_from_slice(&input.prevout.txid.0);
            bytes.extend_from_slice(&input.prevout.vout.to_le_bytes());
            write_var_bytes(&mut bytes, input.script_sig.as_bytes());
            bytes.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_compact_size(&mut bytes, self.outputs.len() as u64);
        for output in &self.outputs {
            bytes.extend_from_slice(&output.value.to_le_bytes());
            write_var_bytes(&mut bytes, output.script_pubkey.as_bytes());
        }

        bytes.extend_from_slice(&self.lock_time.to_le_bytes());

        bytes
    }
}

/// Whether `value` is a valid amount (0 ..= MAX_MONEY)
pub fn money_range(value: Amount) -> bool {
    (0..=MAX_MONEY).contains(&value)
}
