//! LayerZero V2 protocol pieces: contract bindings, packet codec and options encoding.

pub mod contracts;
pub mod options;
pub mod packet;
pub mod types;

pub use options::OptionsBuilder;
pub use packet::{Packet, PacketDecodeError};
pub use types::{EndpointId, ExecutionState, address_to_bytes32, bytes32_to_address};
