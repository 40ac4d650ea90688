//! Interzone (IZ) node startup
//!
//! Parses flags and the config file, selects the network, forces parameter
//! construction (which checks the genesis block) and reports the result.

use clap::Parser;
use log::{error, info};

use interzone_core::chainparams::{freeze_params, select_params_from_flags};
use interzone_core::config::{Cli, Settings};
use interzone_core::constants::{CHAIN_NAME, COIN};
use interzone_core::crypto::random::seed_insecure_rand;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = Settings::resolve(&cli)?;
    interzone_core::init_logger_with(settings.log_level);
    if let Some(path) = &settings.config_file {
        info!("loaded config file {}", path.display());
    }

    let network = match select_params_from_flags(&settings.flags) {
        Ok(network) => network,
        Err(err) => {
            error!("{}", err);
            return Err(err.into());
        }
    };
    let params = interzone_core::chainparams::params();
    freeze_params();
    seed_insecure_rand(false);

    if settings.print_params {
        println!("{}", serde_json::to_string_pretty(&params.summary())?);
        return Ok(());
    }

    let genesis = params.genesis_block();
    info!("{} node starting on {}", CHAIN_NAME, network);
    info!("  genesis hash:  {}", params.genesis_hash());
    info!("  merkle root:   {}", genesis.header.merkle_root);
    info!("  genesis time:  {}", genesis.header.timestamp);
    info!("  genesis bits:  0x{:08x}", genesis.header.bits);
    info!("  genesis value: {} {}", genesis.transactions[0].outputs[0].value / COIN, CHAIN_NAME);
    info!("  magic:         {}", hex::encode(params.message_start()));
    info!("  ports:         p2p {} rpc {}", params.default_port(), params.rpc_port());
    info!("  data dir:      {}", settings.network_datadir(params.data_dir()).display());
    info!("  dns seeds:     {}", params.dns_seeds().len());
    info!("  fixed seeds:   {}", params.fixed_seeds().len());
    if !params.require_rpc_password() {
        info!("  RPC password not required on {}", network);
    }

    Ok(())
}
