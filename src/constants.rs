//! Bridge and relayer constants.

/// Gas limit used for each relayer transaction (DVN verify, commit and `lzReceive`).
///
/// These are fixed rather than estimated.
pub const RELAY_TX_GAS_LIMIT: u64 = 200_000;

/// Gas granted to `lzReceive` on the destination chain for a plain OFT transfer.
pub const OFT_LZ_RECEIVE_GAS: u128 = 200_000;

/// Gas limit for wrapped-native token transactions (`deposit`, `send`) and for the
/// `lzReceive` option attached to them.
pub const WRAPPED_TOKEN_GAS_LIMIT: u64 = 8_000_000;

/// Gas limit for `setPeer`.
pub const SET_PEER_GAS_LIMIT: u64 = 1_000_000;

/// OFT message type for a plain send.
pub const MSG_TYPE_SEND: u16 = 1;

/// OFT message type for a send with a compose call.
pub const MSG_TYPE_SEND_AND_CALL: u16 = 2;

/// Default token name used when deploying a bridged token.
pub const DEFAULT_TOKEN_NAME: &str = "Subspace Wrapped TSSC";

/// Default token symbol used when deploying a bridged token.
pub const DEFAULT_TOKEN_SYMBOL: &str = "WTSSC";
