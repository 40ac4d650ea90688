//! Nonce search
//!
//! Used to mine regression-test blocks and to recompute genesis nonces when
//! a parameter table changes.

use crate::chainparams::GenesisSpec;
use crate::consensus::{compact_to_target, hash_to_target, Block, BlockHeader};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Mining result
#[derive(Debug)]
pub enum MiningResult {
    /// Found a header meeting its target
    Success(BlockHeader),
    /// Stop signal was raised
    Interrupted,
    /// Every nonce from the start value was tried, or the bits are unusable
    Exhausted,
}

/// Proof-of-work nonce searcher
#[derive(Clone, Default)]
pub struct Miner {
    stop_signal: Arc<AtomicBool>,
}

impl Miner {
    pub fn new() -> Self {
        Self {
            stop_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a stop signal handle
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_signal)
    }

    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.stop_signal.store(false, Ordering::SeqCst);
    }

    /// Search nonces upward from `header.nonce`
    ///
    /// The timestamp is left untouched, so the search ends when the nonce
    /// space is exhausted.
    pub fn mine_header<F>(&self, mut header: BlockHeader, progress_interval: u64, mut callback: F) -> MiningResult
    where
        F: FnMut(u64),
    {
        let target = match compact_to_target(header.bits) {
            Ok(target) => target,
            Err(err) => {
                debug!("cannot mine: {}", err);
                return MiningResult::Exhausted;
            }
        };
        let start = header.nonce;
        let mut iterations = 0u64;

        loop {
            if self.stop_signal.load(Ordering::SeqCst) {
                return MiningResult::Interrupted;
            }

            if hash_to_target(&header.hash()) <= target {
                return MiningResult::Success(header);
            }

            header.nonce = header.nonce.wrapping_add(1);
            iterations += 1;

            if progress_interval > 0 && iterations % progress_interval == 0 {
                callback(iterations);
            }

            if header.nonce == start {
                return MiningResult::Exhausted;
            }
        }
    }

    /// Solved copy of `header`, if one exists from its starting nonce
    pub fn solve(&self, header: BlockHeader) -> Option<BlockHeader> {
        match self.mine_header(header, 0, |_| {}) {
            MiningResult::Success(header) => Some(header),
            MiningResult::Interrupted | MiningResult::Exhausted => None,
        }
    }

    /// Mine a genesis recipe from nonce zero
    pub fn mine_genesis(&self, spec: &GenesisSpec) -> Option<Block> {
        let mut block = spec.block();
        block.header.nonce = 0;

        let header = self.solve(block.header.clone())?;
        info!("genesis nonce {} hash {}", header.nonce, header.hash());
        block.header = header;
        Some(block)
    }
}
