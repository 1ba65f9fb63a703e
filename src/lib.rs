//! # LayerZero bridge
//!
//! Tooling for an OFT token bridged between two EVM chains over LayerZero V2, and a relayer
//! that acts as DVN and executor for the packets sent between them.

pub mod bridge;
pub mod chain;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod layerzero;
pub mod listener;
pub mod metrics;
pub mod relay;
pub mod subscription;
