//! Decoding of the `PacketSent.encodedPayload` bytes.

use super::{
    contracts::Origin,
    types::{EndpointId, bytes32_to_address},
};
use alloy::{
    hex::FromHexError,
    primitives::{Address, B256, Bytes, FixedBytes, hex, keccak256},
};
use tracing::info;

/// Length of the PacketV1 header: version, nonce, srcEid, sender, dstEid, receiver.
pub const PACKET_HEADER_LENGTH: usize = 81;

/// Length of the GUID that opens the payload.
pub const GUID_LENGTH: usize = 32;

/// The only packet version this codec understands.
pub const PACKET_VERSION: u8 = 1;

const MIN_PACKET_LENGTH: usize = PACKET_HEADER_LENGTH + GUID_LENGTH;

/// Errors raised while decoding an encoded packet.
#[derive(Debug, thiserror::Error)]
pub enum PacketDecodeError {
    /// The hex string is not valid hex.
    #[error("invalid packet hex: {0}")]
    InvalidHex(#[from] FromHexError),
    /// Fewer bytes than a header plus GUID.
    #[error("encoded packet too short: expected at least {min} bytes, got {len}")]
    TooShort { len: usize, min: usize },
    /// Version byte other than [`PACKET_VERSION`].
    #[error("unsupported packet version {0}")]
    UnsupportedVersion(u8),
}

/// A decoded LayerZero PacketV1.
///
/// Layout (`abi.encodePacked`):
/// - `version` (1 byte)
/// - `nonce` (8 bytes)
/// - `srcEid` (4 bytes)
/// - `sender` (32 bytes)
/// - `dstEid` (4 bytes)
/// - `receiver` (32 bytes)
/// - `guid` (32 bytes)
/// - `message` (variable)
///
/// The first six fields form the 81-byte header; `guid ‖ message` is the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub version: u8,
    pub nonce: u64,
    pub src_eid: EndpointId,
    pub sender: B256,
    pub dst_eid: EndpointId,
    pub receiver: B256,
    pub guid: B256,
    /// The raw 81-byte header, as submitted to `verify` and `commitVerification`.
    pub header: Bytes,
    /// Everything after the header.
    pub payload: Bytes,
    /// The application message, i.e. the payload without its GUID.
    pub message: Bytes,
}

impl Packet {
    /// Decodes a packet from raw bytes.
    pub fn decode(encoded: &[u8]) -> Result<Self, PacketDecodeError> {
        if encoded.len() < MIN_PACKET_LENGTH {
            return Err(PacketDecodeError::TooShort {
                len: encoded.len(),
                min: MIN_PACKET_LENGTH,
            });
        }

        let version = encoded[0];
        if version != PACKET_VERSION {
            return Err(PacketDecodeError::UnsupportedVersion(version));
        }

        let nonce = u64::from_be_bytes(FixedBytes::<8>::from_slice(&encoded[1..9]).0);
        let src_eid = u32::from_be_bytes(FixedBytes::<4>::from_slice(&encoded[9..13]).0);
        let sender = B256::from_slice(&encoded[13..45]);
        let dst_eid = u32::from_be_bytes(FixedBytes::<4>::from_slice(&encoded[45..49]).0);
        let receiver = B256::from_slice(&encoded[49..81]);
        let guid = B256::from_slice(&encoded[81..113]);

        Ok(Self {
            version,
            nonce,
            src_eid,
            sender,
            dst_eid,
            receiver,
            guid,
            header: Bytes::copy_from_slice(&encoded[..PACKET_HEADER_LENGTH]),
            payload: Bytes::copy_from_slice(&encoded[PACKET_HEADER_LENGTH..]),
            message: Bytes::copy_from_slice(&encoded[MIN_PACKET_LENGTH..]),
        })
    }

    /// Decodes a packet from a hex string, with or without `0x` prefix.
    pub fn from_hex(encoded: &str) -> Result<Self, PacketDecodeError> {
        Self::decode(&hex::decode(encoded)?)
    }

    /// `keccak256(header)`, as checked by `verifiable`.
    pub fn header_hash(&self) -> B256 {
        keccak256(&self.header)
    }

    /// `keccak256(guid ‖ message)`.
    pub fn payload_hash(&self) -> B256 {
        keccak256(&self.payload)
    }

    /// The origin used by the endpoint to identify this packet.
    pub fn origin(&self) -> Origin {
        Origin { srcEid: self.src_eid, sender: self.sender, nonce: self.nonce }
    }

    pub fn sender_address(&self) -> Address {
        bytes32_to_address(self.sender)
    }

    pub fn receiver_address(&self) -> Address {
        bytes32_to_address(self.receiver)
    }

    /// Logs where this packet is going.
    pub fn log_route(&self, src_network: &str, dst_network: &str) {
        info!(
            src_network,
            dst_network,
            src_eid = self.src_eid,
            dst_eid = self.dst_eid,
            sender = %self.sender_address(),
            receiver = %self.receiver_address(),
            nonce = self.nonce,
            guid = ?self.guid,
            "Packet route"
        );
    }
}
