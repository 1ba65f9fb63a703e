//! # LayerZero relayer
//!
//! Relays LayerZero packets between two chains, acting as DVN and executor.
use clap::Parser;
use lz_bridge::cli::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(err) = args.run().await {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
