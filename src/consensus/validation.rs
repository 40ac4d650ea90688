//! Block and chain validation
//!
//! Pure functions for validating headers and blocks against a parameter set.

use num_bigint::BigUint;
use num_traits::Zero;
use thiserror::Error;

use crate::chainparams::ChainParams;
use crate::consensus::{
    block_value, block_work, calculate_next_difficulty, compact_to_target, get_period_start_height, hash_to_target,
    should_adjust_difficulty, Block, BlockHeader, CompactError,
};
use crate::constants::Amount;
use crate::crypto::Hash;

/// Validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid difficulty bits: {0}")]
    InvalidBits(#[from] CompactError),
    #[error("Difficulty target is zero or above the proof-of-work limit")]
    TargetOutOfRange,
    #[error("Invalid proof of work")]
    InvalidPoW,
    #[error("Invalid merkle root")]
    InvalidMerkleRoot,
    #[error("Duplicate transactions in merkle tree")]
    MutatedMerkleTree,
    #[error("Invalid previous hash")]
    InvalidPrevHash,
    #[error("Invalid difficulty target")]
    InvalidDifficulty,
    #[error("Block has no transactions")]
    EmptyBlock,
    #[error("First transaction is not a coinbase")]
    MissingCoinbase,
    #[error("More than one coinbase")]
    MultipleCoinbase,
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Coinbase pays {actual}, limit is {limit}")]
    InvalidBlockReward { actual: Amount, limit: Amount },
    #[error("Genesis block does not match the network's genesis")]
    GenesisMismatch,
}

/// Validate proof of work
///
/// `bits` must decode to a positive target no easier than the pow limit, and
/// the hash must not exceed that target.
pub fn check_proof_of_work(hash: &Hash, bits: u32, params: &ChainParams) -> Result<(), ValidationError> {
    let target = compact_to_target(bits)?;

    if target.is_zero() || target > params.pow_limit_target() {
        return Err(ValidationError::TargetOutOfRange);
    }

    if hash_to_target(hash) > target {
        return Err(ValidationError::InvalidPoW);
    }

    Ok(())
}

/// Context-free header check
///
/// The network's own genesis header is accepted without proof of work.
/// Blocks are identified by double SHA-256, not the X11 hash the
/// Main and Test genesis nonces were mined against, so those two headers do
/// not meet their own targets.
pub fn check_block_header(header: &BlockHeader, params: &ChainParams) -> Result<(), ValidationError> {
    let hash = header.hash();
    if hash == params.genesis_hash() {
        return Ok(());
    }
    check_proof_of_work(&hash, header.bits, params)
}

/// Check a header against its parent and the expected difficulty
pub fn check_header_context(
    header: &BlockHeader,
    prev_block_hash: &Hash,
    expected_bits: u32,
) -> Result<(), ValidationError> {
    if header.prev_hash != *prev_block_hash {
        return Err(ValidationError::InvalidPrevHash);
    }
    if header.bits != expected_bits {
        return Err(ValidationError::InvalidDifficulty);
    }
    Ok(())
}

/// Context-free block check
///
/// Covers proof of work, coinbase placement, merkle root (including
/// duplicate-transaction mutation) and output value ranges.
pub fn check_block(block: &Block, params: &ChainParams) -> Result<(), ValidationError> {
    check_block_header(&block.header, params)?;

    let (merkle_root, mutated) = block.build_merkle_root();
    if merkle_root != block.header.merkle_root {
        return Err(ValidationError::InvalidMerkleRoot);
    }
    if mutated {
        return Err(ValidationError::MutatedMerkleTree);
    }

    let first = block.transactions.first().ok_or(ValidationError::EmptyBlock)?;
    if !first.is_coinbase() {
        return Err(ValidationError::MissingCoinbase);
    }
    if block.transactions.iter().skip(1).any(|tx| tx.is_coinbase()) {
        return Err(ValidationError::MultipleCoinbase);
    }

    for tx in &block.transactions {
        if tx.inputs.is_empty() || tx.outputs.is_empty() {
            return Err(ValidationError::InvalidTransaction(format!("{} has no inputs or outputs", tx.hash())));
        }
        if tx.value_out().is_none() {
            return Err(ValidationError::InvalidTransaction(format!("{} output value out of range", tx.hash())));
        }
    }

    Ok(())
}

/// Check the coinbase does not claim more than subsidy plus fees
pub fn check_block_reward(
    block: &Block,
    params: &ChainParams,
    height: u64,
    fees: Amount,
) -> Result<(), ValidationError> {
    let coinbase = block.transactions.first().ok_or(ValidationError::EmptyBlock)?;
    let actual = coinbase
        .value_out()
        .ok_or_else(|| ValidationError::InvalidTransaction("coinbase value out of range".to_string()))?;
    let limit = block_value(params, height, fees);

    if actual > limit {
        return Err(ValidationError::InvalidBlockReward { actual, limit });
    }
    Ok(())
}

/// Check a block presented as height 0 is this network's genesis
pub fn check_genesis(block: &Block, params: &ChainParams) -> Result<(), ValidationError> {
    if block.hash() != params.genesis_hash() {
        return Err(ValidationError::GenesisMismatch);
    }
    Ok(())
}

/// Chain validation result
#[derive(Debug, Clone)]
pub struct ChainValidationResult {
    /// Total cumulative work
    pub total_work: BigUint,
    /// Height of the tip (genesis is 0)
    pub height: u64,
    /// Tip hash
    pub tip_hash: Hash,
}

/// Bits the header at `height` must carry
///
/// `headers[0]` is genesis and `height` indexes into `headers`. Between
/// retargets the previous bits carry over; at a retarget boundary they are
/// recomputed from the timestamps of the period that just ended.
pub fn expected_bits(headers: &[BlockHeader], height: u64, params: &ChainParams) -> Result<u32, ValidationError> {
    let prev = height
        .checked_sub(1)
        .and_then(|h| headers.get(h as usize))
        .ok_or(ValidationError::InvalidPrevHash)?;
    if !should_adjust_difficulty(height) {
        return Ok(prev.bits);
    }

    let first = headers
        .get(get_period_start_height(height) as usize)
        .ok_or(ValidationError::InvalidPrevHash)?;
    Ok(calculate_next_difficulty(
        params,
        prev.bits,
        first.timestamp as i64,
        prev.timestamp as i64,
    )?)
}

/// Validate a header chain starting at genesis and sum its work
///
/// Every header must link to its predecessor, carry the expected difficulty
/// and have valid proof of work.
pub fn validate_header_chain(
    headers: &[BlockHeader],
    params: &ChainParams,
) -> Result<ChainValidationResult, ValidationError> {
    let genesis = headers.first().ok_or(ValidationError::EmptyBlock)?;
    if genesis.hash() != params.genesis_hash() {
        return Err(ValidationError::GenesisMismatch);
    }

    let mut total_work = block_work(genesis.bits);
    let mut prev_hash = genesis.hash();

    for (height, header) in headers.iter().enumerate().skip(1) {
        let bits = expected_bits(headers, height as u64, params)?;
        check_header_context(header, &prev_hash, bits)?;
        check_block_header(header, params)?;
        total_work += block_work(header.bits);
        prev_hash = header.hash();
    }

    Ok(ChainValidationResult {
        total_work,
        height: headers.len() as u64 - 1,
        tip_hash: prev_hash,
    })
}

/// Returns true if chain_a has strictly more work than chain_b
pub fn compare_chains(chain_a: &ChainValidationResult, chain_b: &ChainValidationResult) -> bool {
    chain_a.total_work > chain_b.total_work
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chainparams::{main_params, regtest_params, testnet_params};
    use crate::constants::{COIN, DIFFICULTY_ADJUSTMENT_INTERVAL, TARGET_SPACING};
    use crate::mining::Miner;
    use crate::validation::{OutPoint, Script, Transaction, TxInput, TxOutput};

    fn coinbase(value: Amount, tag: i64) -> Transaction {
        Transaction::coinbase(
            Script::new().push_int(tag),
            vec![TxOutput { value, script_pubkey: Script::new() }],
        )
    }

    /// Build and mine a regtest block on top of `prev`
    fn regtest_block(prev: Hash, transactions: Vec<Transaction>) -> Block {
        let mut block = Block::new(
            BlockHeader::new(1, prev, Hash::zero(), 1503324300, 0x207fffff, 0),
            transactions,
        );
        block.header.merkle_root = block.build_merkle_root().0;
        block.header = Miner::new().solve(block.header.clone()).expect("regtest target is trivial");
        block
    }

    /// Mine a bare header on top of `prev`
    fn mined_header(prev: &BlockHeader, timestamp: u32, bits: u32) -> BlockHeader {
        let header = BlockHeader::new(1, prev.hash(), Hash([7; 32]), timestamp, bits, 0);
        Miner::new().solve(header).expect("regtest target is trivial")
    }

    #[test]
    fn test_genesis_blocks_pass_context_free_checks() {
        for params in [main_params(), testnet_params(), regtest_params()] {
            assert!(check_block(params.genesis_block(), params).is_ok(), "{}", params.network());
            assert!(check_genesis(params.genesis_block(), params).is_ok());
        }
    }

    #[test]
    fn test_genesis_exemption_is_hash_exact() {
        let params = main_params();
        let mut header = params.genesis_block().header.clone();
        header.nonce ^= 1;
        assert_eq!(check_block_header(&header, params), Err(ValidationError::InvalidPoW));

        // Another network's genesis gets no exemption
        let foreign = &testnet_params().genesis_block().header;
        assert_eq!(check_block_header(foreign, params), Err(ValidationError::InvalidPoW));
    }

    #[test]
    fn test_target_above_limit_rejected() {
        let params = main_params();
        assert_eq!(
            check_proof_of_work(&Hash::zero(), 0x207fffff, params),
            Err(ValidationError::TargetOutOfRange)
        );
        assert_eq!(
            check_proof_of_work(&Hash::zero(), 0x04923456, params),
            Err(ValidationError::InvalidBits(CompactError::Negative(0x04923456)))
        );
    }

    #[test]
    fn test_hash_above_target_rejected() {
        let params = main_params();
        let hash = Hash([0xff; 32]);
        assert_eq!(check_proof_of_work(&hash, 0x1e0fffff, params), Err(ValidationError::InvalidPoW));
        assert!(check_proof_of_work(&Hash::zero(), 0x1e0fffff, params).is_ok());
    }

    #[test]
    fn test_invalid_merkle_root() {
        let params = regtest_params();
        let mut block = regtest_block(params.genesis_hash(), vec![coinbase(COIN, 1)]);
        block.transactions.push(coinbase(COIN, 2));
        assert_eq!(check_block(&block, params), Err(ValidationError::InvalidMerkleRoot));
    }

    #[test]
    fn test_second_coinbase_rejected() {
        let params = regtest_params();
        let block = regtest_block(params.genesis_hash(), vec![coinbase(COIN, 1), coinbase(COIN, 2)]);
        assert_eq!(check_block(&block, params), Err(ValidationError::MultipleCoinbase));
    }

    #[test]
    fn test_duplicated_transactions_rejected() {
        let params = regtest_params();
        let tx = coinbase(COIN, 1);
        let spend = |vout: u32| {
            Transaction::new(
                vec![TxInput {
                    prevout: OutPoint { txid: tx.hash(), vout },
                    script_sig: Script::new(),
                    sequence: u32::MAX,
                }],
                vec![TxOutput { value: COIN, script_pubkey: Script::new() }],
            )
        };
        let (a, b) = (spend(0), spend(1));
        let block = regtest_block(params.genesis_hash(), vec![tx.clone(), a, b.clone(), b]);
        assert_eq!(check_block(&block, params), Err(ValidationError::MutatedMerkleTree));
    }

    #[test]
    fn test_excess_reward_rejected() {
        let params = regtest_params();
        let block = regtest_block(params.genesis_hash(), vec![coinbase(16 * COIN + 1, 1)]);
        assert!(check_block(&block, params).is_ok());
        assert_eq!(
            check_block_reward(&block, params, 1, 0),
            Err(ValidationError::InvalidBlockReward { actual: 16 * COIN + 1, limit: 16 * COIN })
        );
        assert!(check_block_reward(&block, params, 1, 1).is_ok());
    }

    #[test]
    fn test_header_context() {
        let header = BlockHeader::new(1, Hash::zero(), Hash::zero(), 0, 0x207fffff, 0);
        assert!(check_header_context(&header, &Hash::zero(), 0x207fffff).is_ok());
        assert_eq!(
            check_header_context(&header, &Hash([1; 32]), 0x207fffff),
            Err(ValidationError::InvalidPrevHash)
        );
        assert_eq!(
            check_header_context(&header, &Hash::zero(), 0x1e0fffff),
            Err(ValidationError::InvalidDifficulty)
        );
    }

    #[test]
    fn test_header_chain_work_accumulates() {
        let params = regtest_params();
        let genesis = params.genesis_block().header.clone();
        let b1 = regtest_block(genesis.hash(), vec![coinbase(COIN, 1)]);
        let b2 = regtest_block(b1.hash(), vec![coinbase(COIN, 2)]);

        let short = validate_header_chain(&[genesis.clone(), b1.header.clone()], params).unwrap();
        let long = validate_header_chain(&[genesis, b1.header, b2.header.clone()], params).unwrap();

        assert_eq!(long.height, 2);
        assert_eq!(long.tip_hash, b2.hash());
        assert!(compare_chains(&long, &short));
        assert!(!compare_chains(&short, &long));
    }

    #[test]
    fn test_header_chain_rejects_changed_bits_between_retargets() {
        let params = regtest_params();
        let genesis = params.genesis_block().header.clone();
        let harder = mined_header(&genesis, genesis.timestamp + 150, 0x200fffff);
        assert!(check_block_header(&harder, params).is_ok());
        assert_eq!(
            validate_header_chain(&[genesis.clone(), harder], params).unwrap_err(),
            ValidationError::InvalidDifficulty
        );

        let same = mined_header(&genesis, genesis.timestamp + 150, genesis.bits);
        assert!(validate_header_chain(&[genesis, same], params).is_ok());
    }

    #[test]
    fn test_header_chain_retargets_at_boundary() {
        let params = regtest_params();
        let genesis = params.genesis_block().header.clone();
        let mut headers = vec![genesis.clone()];
        for height in 1..DIFFICULTY_ADJUSTMENT_INTERVAL {
            let prev = &headers[height as usize - 1];
            let timestamp = genesis.timestamp + (height * TARGET_SPACING as u64) as u32;
            let next = mined_header(prev, timestamp, genesis.bits);
            headers.push(next);
        }
        assert!(validate_header_chain(&headers, params).is_ok());

        // One spacing short of a full period: the target tightens
        let boundary = DIFFICULTY_ADJUSTMENT_INTERVAL;
        let retarget = expected_bits(&headers, boundary, params).unwrap();
        assert_ne!(retarget, genesis.bits);
        assert!(compact_to_target(retarget).unwrap() < compact_to_target(genesis.bits).unwrap());

        let last = headers[boundary as usize - 1].clone();
        let timestamp = last.timestamp + TARGET_SPACING as u32;

        let mut stale = headers.clone();
        stale.push(mined_header(&last, timestamp, genesis.bits));
        assert_eq!(
            validate_header_chain(&stale, params).unwrap_err(),
            ValidationError::InvalidDifficulty
        );

        headers.push(mined_header(&last, timestamp, retarget));
        let result = validate_header_chain(&headers, params).unwrap();
        assert_eq!(result.height, boundary);
    }

    #[test]
    fn test_header_chain_rejects_foreign_genesis() {
        let params = regtest_params();
        let foreign = main_params().genesis_block().header.clone();
        assert_eq!(
            validate_header_chain(&[foreign], params).unwrap_err(),
            ValidationError::GenesisMismatch
        );
    }
}
