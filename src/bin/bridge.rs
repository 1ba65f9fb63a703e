//! Bridge CLI for setting up and using the bridged token.
//!
//! # Examples
//!
//! Deploy missing tokens and wire them as peers:
//! ```sh
//! lz-bridge setup
//! ```
//!
//! Send 0.01 wrapped tokens from chain A to yourself on chain B:
//! ```sh
//! lz-bridge --log-level debug send --side a --amount 0.01 --wrapped
//! ```

use alloy::primitives::{
    Address, U256,
    utils::{UnitsError, parse_ether},
};
use clap::{Parser, Subcommand};
use eyre::Result;
use lz_bridge::{
    bridge::{Side, TokenBridge},
    cli::{Verbosity, init_tracing},
    config::{BridgeConfig, ProcessEnv},
    constants::OFT_LZ_RECEIVE_GAS,
};

/// Main CLI structure for the bridge tool.
#[derive(Debug, Parser)]
#[command(name = "lz-bridge")]
#[command(about = "Set up and use a LayerZero bridged token", long_about = None)]
struct Cli {
    /// Log verbosity.
    #[arg(long, global = true, value_enum, value_name = "LEVEL", default_value = "info")]
    log_level: Verbosity,
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands available in the bridge CLI.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Deploy missing tokens and set peers on both chains
    Setup,
    /// Set enforced options on the token of one chain
    EnforceOptions {
        /// Chain whose token is configured
        #[arg(long, value_enum)]
        side: Side,
    },
    /// Send tokens to the other chain
    Send(SendCommand),
    /// Show the total supply on both chains
    Supplies,
    /// Show the token balance of an address on both chains
    Balances {
        /// The address to query
        address: Address,
    },
}

/// Command for sending tokens across.
#[derive(Debug, Parser)]
struct SendCommand {
    /// Chain to send from
    #[arg(long, value_enum)]
    side: Side,
    /// Amount in ether units, e.g. `0.01`
    #[arg(long, value_parser = parse_amount)]
    amount: U256,
    /// Recipient on the other chain. Defaults to the signer.
    #[arg(long)]
    recipient: Option<Address>,
    /// Wrap native currency first when the token balance is short
    #[arg(long)]
    wrapped: bool,
}

impl SendCommand {
    async fn run(self, bridge: &TokenBridge) -> Result<()> {
        let recipient = self.recipient.unwrap_or_else(|| bridge.signer_address(self.side.other()));
        if self.wrapped {
            bridge.send_wrapped(self.side, self.amount, recipient).await?;
        } else {
            bridge.send_tokens(self.side, self.amount, recipient, OFT_LZ_RECEIVE_GAS).await?;
        }
        Ok(())
    }
}

/// Parses an ether denominated amount into wei.
fn parse_amount(arg: &str) -> Result<U256, UnitsError> {
    parse_ether(arg)
}

impl Cli {
    async fn run(self) -> Result<()> {
        // a missing .env file is fine, the variables may come from the environment
        dotenvy::dotenv().ok();
        init_tracing(Some(self.log_level));

        let config = BridgeConfig::from_env(&ProcessEnv)?;
        let mut bridge = TokenBridge::connect(config).await?;

        match self.command {
            Commands::Setup => {
                bridge.deploy_tokens().await?;
                bridge.set_peers().await?;
            }
            Commands::EnforceOptions { side } => {
                bridge.set_enforced_options(side).await?;
            }
            Commands::Send(send) => send.run(&bridge).await?,
            Commands::Supplies => {
                bridge.total_supplies().await?;
            }
            Commands::Balances { address } => {
                bridge.balances_of(address).await?;
            }
        }

        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = cli.run().await {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
