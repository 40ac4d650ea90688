//! Block reward calculation
//!
//! Deterministic subsidy schedule: a fixed base subsidy halved every
//! `subsidy_halving_interval` blocks, split between miner and masternode
//! according to the reward fork heights of the active network.

use crate::chainparams::{main_params, ChainParams, ForkId, Network};
use crate::constants::{Amount, COIN, MAX_MONEY};

/// Subsidy of the first halving era
pub const BASE_SUBSIDY: Amount = 16 * COIN;

/// Halvings after which the subsidy is zero
const MAX_HALVINGS: u64 = 64;

/// Block subsidy at `height`, excluding fees
///
/// This is a pure, deterministic function of the height and the network's
/// halving interval. The genesis output uses the height 0 value but is not
/// spendable.
pub fn block_subsidy(params: &ChainParams, height: u64) -> Amount {
    let halvings = height / params.subsidy_halving_interval();
    if halvings >= MAX_HALVINGS {
        return 0;
    }
    BASE_SUBSIDY >> halvings
}

/// Total value a coinbase at `height` may claim: subsidy plus fees
pub fn block_value(params: &ChainParams, height: u64, fees: Amount) -> Amount {
    block_subsidy(params, height).saturating_add(fees)
}

/// Masternode share of `block_value` at `height`
///
/// Nothing before the first reward fork, a fifth from it, two fifths from
/// the second.
pub fn masternode_payment(params: &ChainParams, height: u64, block_value: Amount) -> Amount {
    if params.is_fork_active(ForkId::Reward2, height) {
        block_value * 2 / 5
    } else if params.is_fork_active(ForkId::Reward1, height) {
        block_value / 5
    } else {
        0
    }
}

/// Whether a masternode announcing `port` is acceptable at `height`
///
/// Once the masternode port fork is active, mainnet masternodes must listen
/// on the default port and other networks must stay off the mainnet port.
pub fn masternode_port_valid(params: &ChainParams, height: u64, port: u16) -> bool {
    if !params.is_fork_active(ForkId::MasternodePort, height) {
        return true;
    }
    match params.network() {
        Network::Main => port == params.default_port(),
        Network::Test | Network::Regression => port != main_params().default_port(),
    }
}

/// Calculate total subsidy issued by blocks `1..=num_blocks`
///
/// Simulates the schedule; used for testing and verification.
pub fn calculate_total_issued(params: &ChainParams, num_blocks: u64) -> Amount {
    let interval = params.subsidy_halving_interval();
    let mut total: Amount = 0;
    let mut height = 1;

    // Walk whole eras instead of single blocks.
    while height <= num_blocks {
        let subsidy = block_subsidy(params, height);
        if subsidy == 0 {
            break;
        }
        let era_end = ((height / interval) + 1) * interval - 1;
        let last = era_end.min(num_blocks);
        total = total.saturating_add(subsidy.saturating_mul((last - height + 1) as Amount));
        height = last + 1;
    }

    total
}

/// Verify that issuance up to `up_to_height` stays within MAX_MONEY
pub fn verify_supply_invariant(params: &ChainParams, up_to_height: u64) -> bool {
    calculate_total_issued(params, up_to_height) <= MAX_MONEY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chainparams::{regtest_params, testnet_params};

    #[test]
    fn test_genesis_height_subsidy_matches_genesis_output() {
        let params = main_params();
        assert_eq!(block_subsidy(params, 0), 16 * COIN);
        assert_eq!(params.genesis_block().transactions[0].outputs[0].value, block_subsidy(params, 0));
    }

    #[test]
    fn test_halving_boundaries() {
        let params = main_params();
        let interval = params.subsidy_halving_interval();
        assert_eq!(block_subsidy(params, interval - 1), BASE_SUBSIDY);
        assert_eq!(block_subsidy(params, interval), BASE_SUBSIDY / 2);
        assert_eq!(block_subsidy(params, interval * 2), BASE_SUBSIDY / 4);
    }

    #[test]
    fn test_regtest_halves_quickly() {
        let params = regtest_params();
        assert_eq!(block_subsidy(params, 149), BASE_SUBSIDY);
        assert_eq!(block_subsidy(params, 150), BASE_SUBSIDY / 2);
    }

    #[test]
    fn test_subsidy_eventually_zero() {
        let params = regtest_params();
        assert_eq!(block_subsidy(params, 150 * 64), 0);
        assert_eq!(block_subsidy(params, u64::MAX), 0);
    }

    #[test]
    fn test_block_value_adds_fees() {
        let params = main_params();
        assert_eq!(block_value(params, 1, 1234), BASE_SUBSIDY + 1234);
    }

    #[test]
    fn test_masternode_share_follows_forks() {
        let params = main_params();
        let value = 10 * COIN;
        assert_eq!(masternode_payment(params, 9_999, value), 0);
        assert_eq!(masternode_payment(params, 10_000, value), 2 * COIN);
        assert_eq!(masternode_payment(params, 250_000, value), 4 * COIN);

        let test = testnet_params();
        assert_eq!(masternode_payment(test, 250, value), 2 * COIN);
        assert_eq!(masternode_payment(test, 500, value), 4 * COIN);
    }

    #[test]
    fn test_masternode_port_rule() {
        let main = main_params();
        assert!(masternode_port_valid(main, 99, 1234));
        assert!(!masternode_port_valid(main, 100, 1234));
        assert!(masternode_port_valid(main, 100, main.default_port()));

        let test = testnet_params();
        assert!(masternode_port_valid(test, 100, test.default_port()));
        assert!(!masternode_port_valid(test, 100, main.default_port()));
    }

    #[test]
    fn test_total_issued_matches_block_walk() {
        let params = regtest_params();
        let walked: Amount = (1..=1000).map(|h| block_subsidy(params, h)).sum();
        assert_eq!(calculate_total_issued(params, 1000), walked);
    }

    #[test]
    fn test_supply_never_exceeded() {
        for params in [main_params(), testnet_params(), regtest_params()] {
            assert!(verify_supply_invariant(params, u64::MAX / 2));
        }
    }
}
