//! Packet relay: DVN verification, verification commit and execution on the destination.
//!
//! For every `PacketSent` on one chain the pipeline:
//!
//! 1. decodes the packet and resolves the receive library and ULN config of its receiver,
//! 2. checks the execution state; already executable packets go straight to execution,
//! 3. submits a DVN `verify` using the first required DVN of the config,
//! 4. commits the verification if the receive library reports the packet as verifiable,
//! 5. calls `lzReceive` if the endpoint view reports the packet as executable.
//!
//! Protocol states that stop a packet are returned as [`RelayOutcome`]s. Nothing is retried.

pub mod contracts;

pub use contracts::{Dvn, Endpoint, EndpointView, ReceiveLibrary, RpcDestination};

use crate::{
    error::RelayError,
    layerzero::{EndpointId, ExecutionState, Packet, contracts::ILayerZeroEndpointV2::PacketSent},
    metrics::RelayMetrics,
};
use alloy::primitives::{Address, TxHash};
use std::{fmt, sync::Arc};
use strum::Display;
use tracing::{info, instrument, warn};

/// Progress of a packet through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PipelineStatus {
    /// Sent on the source chain, not yet verified.
    Inflight,
    /// Verification committed on the destination.
    Confirming,
    /// Executed on the destination.
    Delivered,
}

/// Result of relaying one packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// `lzReceive` was executed.
    Delivered {
        /// Hash of the `lzReceive` transaction
        tx_hash: TxHash,
    },
    /// The receive library did not consider the packet verifiable after the DVN attestation.
    NotVerifiable,
    /// The packet was not executable after verification.
    NotExecutable {
        /// The state reported by the endpoint view
        state: ExecutionState,
    },
    /// The receiver's ULN config has no required DVN to attest with.
    NoRequiredDvn,
    /// The packet had already been executed.
    AlreadyExecuted,
}

impl RelayOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Contract roles on the chain packets are delivered to.
#[derive(Clone)]
pub struct Destination {
    /// Network name used in logs.
    pub network: String,
    /// Endpoint ID of the destination chain.
    pub eid: EndpointId,
    pub endpoint: Arc<dyn Endpoint>,
    pub view: Arc<dyn EndpointView>,
    pub receive_library: Arc<dyn ReceiveLibrary>,
    pub dvn: Arc<dyn Dvn>,
    /// Receive library the operator expects packets to resolve to.
    pub expected_receive_library: Option<Address>,
    /// DVN the operator expects to be required.
    pub expected_dvn: Option<Address>,
}

impl Destination {
    /// Uses `rpc` for every contract role.
    pub fn from_rpc(network: impl Into<String>, eid: EndpointId, rpc: RpcDestination) -> Self {
        let rpc = Arc::new(rpc);
        Self {
            network: network.into(),
            eid,
            endpoint: rpc.clone(),
            view: rpc.clone(),
            receive_library: rpc.clone(),
            dvn: rpc,
            expected_receive_library: None,
            expected_dvn: None,
        }
    }

    /// Sets the receive library and DVN the operator expects.
    pub fn with_expected(mut self, receive_library: Option<Address>, dvn: Option<Address>) -> Self {
        self.expected_receive_library = receive_library;
        self.expected_dvn = dvn;
        self
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("network", &self.network)
            .field("eid", &self.eid)
            .field("expected_receive_library", &self.expected_receive_library)
            .field("expected_dvn", &self.expected_dvn)
            .finish_non_exhaustive()
    }
}

/// Relays the packet of `event`, sent on `source_network`, to `destination`.
pub async fn relay_packet(
    source_network: &str,
    destination: &Destination,
    event: &PacketSent,
) -> Result<RelayOutcome, RelayError> {
    let packet = Packet::decode(&event.encodedPayload)?;
    packet.log_route(source_network, &destination.network);
    info!(guid = ?packet.guid, status = %PipelineStatus::Inflight, "Packet status");

    if packet.dst_eid != destination.eid {
        warn!(
            guid = ?packet.guid,
            dst_eid = packet.dst_eid,
            expected = destination.eid,
            "Packet destination does not match the relay route"
        );
    }

    let origin = packet.origin();
    let receiver = packet.receiver_address();
    let header_hash = packet.header_hash();
    let payload_hash = packet.payload_hash();

    let library = destination.endpoint.receive_library(receiver, packet.src_eid).await?;
    if let Some(expected) = destination.expected_receive_library
        && expected != library
    {
        warn!(%library, %expected, "Receiver uses an unexpected receive library");
    }

    let config = destination.receive_library.uln_config(library, receiver, packet.src_eid).await?;
    info!(
        %library,
        confirmations = config.confirmations,
        required_dvns = ?config.requiredDVNs,
        optional_dvns = ?config.optionalDVNs,
        optional_threshold = config.optionalDVNThreshold,
        "Fetched ULN config"
    );

    let state = destination.view.executable(&origin, receiver).await?;
    info!(guid = ?packet.guid, %state, "Execution state before verification");

    match state {
        ExecutionState::Executed => {
            info!(guid = ?packet.guid, "Packet already executed");
            return Ok(RelayOutcome::AlreadyExecuted);
        }
        ExecutionState::Executable => {
            info!(guid = ?packet.guid, "Packet already verified, executing");
        }
        ExecutionState::NotExecutable | ExecutionState::VerifiedButNotExecutable => {
            let Some(&dvn) = config.requiredDVNs.first() else {
                warn!(guid = ?packet.guid, "ULN config has no required DVN");
                return Ok(RelayOutcome::NoRequiredDvn);
            };
            if let Some(expected) = destination.expected_dvn
                && expected != dvn
            {
                warn!(%dvn, %expected, "Required DVN differs from the configured DVN");
            }

            let tx_hash = destination
                .dvn
                .verify(dvn, library, packet.header.clone(), payload_hash, config.confirmations)
                .await?;
            info!(guid = ?packet.guid, %dvn, ?tx_hash, "DVN verified packet");

            let state = destination.view.executable(&origin, receiver).await?;
            info!(guid = ?packet.guid, %state, "Execution state after DVN verification");

            if !destination
                .receive_library
                .verifiable(library, &config, header_hash, payload_hash)
                .await?
            {
                warn!(guid = ?packet.guid, "Packet is not verifiable");
                return Ok(RelayOutcome::NotVerifiable);
            }

            let tx_hash = destination
                .receive_library
                .commit_verification(library, packet.header.clone(), payload_hash)
                .await?;
            info!(
                guid = ?packet.guid,
                ?tx_hash,
                status = %PipelineStatus::Confirming,
                "Committed verification"
            );

            let state = destination.view.executable(&origin, receiver).await?;
            if state != ExecutionState::Executable {
                warn!(guid = ?packet.guid, %state, "Packet is not executable");
                return Ok(RelayOutcome::NotExecutable { state });
            }
        }
    }

    let tx_hash = destination
        .endpoint
        .lz_receive(origin, receiver, packet.guid, packet.message.clone())
        .await?;
    info!(guid = ?packet.guid, ?tx_hash, status = %PipelineStatus::Delivered, "Packet delivered");

    Ok(RelayOutcome::Delivered { tx_hash })
}

/// Relays packets from one chain to the other.
#[derive(Clone)]
pub struct PacketRelayer {
    source_network: String,
    destination: Arc<Destination>,
    metrics: Arc<RelayMetrics>,
}

impl PacketRelayer {
    /// Creates a relayer for packets sent on `source_network` towards `destination`.
    pub fn new(source_network: impl Into<String>, destination: Destination) -> Self {
        let source_network = source_network.into();
        let metrics = RelayMetrics::for_route(&source_network, &destination.network);
        Self { source_network, destination: Arc::new(destination), metrics: Arc::new(metrics) }
    }

    pub fn source_network(&self) -> &str {
        &self.source_network
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Relays a single `PacketSent` event.
    #[instrument(skip_all, fields(src = %self.source_network, dst = %self.destination.network))]
    pub async fn relay(&self, event: &PacketSent) -> Result<RelayOutcome, RelayError> {
        self.metrics.record_seen();

        let outcome = relay_packet(&self.source_network, &self.destination, event).await?;
        match &outcome {
            RelayOutcome::Delivered { .. } => self.metrics.record_delivered(),
            RelayOutcome::AlreadyExecuted => {}
            _ => self.metrics.record_abandoned(),
        }

        Ok(outcome)
    }
}

impl fmt::Debug for PacketRelayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketRelayer")
            .field("source_network", &self.source_network)
            .field("destination", &self.destination)
            .finish()
    }
}
