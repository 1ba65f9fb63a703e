//! Relayer errors.

use crate::layerzero::PacketDecodeError;
use alloy::{
    primitives::TxHash,
    providers::PendingTransactionError,
    transports::{RpcError, TransportErrorKind},
};

/// Errors that abort a relay attempt.
///
/// Protocol states that merely stop a packet (not verifiable, not executable) are reported as
/// [`RelayOutcome`](crate::relay::RelayOutcome) values instead.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The encoded packet could not be decoded.
    #[error(transparent)]
    Decode(#[from] PacketDecodeError),
    /// The endpoint view returned an execution state we do not know.
    #[error("Unknown execution state: {0}")]
    UnknownExecutionState(u8),
    /// A submitted transaction was mined but reverted.
    #[error("{call} transaction {tx_hash} reverted")]
    Reverted {
        /// The contract call that reverted
        call: &'static str,
        /// Hash of the reverted transaction
        tx_hash: TxHash,
    },
    /// An event subscription ended.
    #[error("{event} subscription on {network} closed")]
    SubscriptionClosed {
        /// Network the subscription was opened on
        network: String,
        /// Event name
        event: &'static str,
    },
    /// RPC error.
    #[error(transparent)]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// Contract error.
    #[error(transparent)]
    Contract(#[from] alloy::contract::Error),
    /// Pending transaction error.
    #[error(transparent)]
    PendingTransaction(#[from] PendingTransactionError),
}
