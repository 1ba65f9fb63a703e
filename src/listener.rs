//! Event listener binding the relay pipeline to both chains.
//!
//! Every `PacketSent` on one chain is relayed to the other chain in its own task. Token,
//! send library and delivery events are only logged.

use crate::{
    chain::Connection,
    config::{RelayerChainSettings, RelayerConfig},
    error::RelayError,
    layerzero::contracts::{
        IBridgedToken::{OFTReceived, OFTSent, Transfer},
        ILayerZeroEndpointV2::{PacketDelivered, PacketSent},
        ISendUln302::{DVNFeePaid, ExecutorFeePaid},
    },
    relay::{Destination, PacketRelayer, RpcDestination},
    subscription::subscribe,
};
use alloy::{
    primitives::{Address, utils::format_ether},
    rpc::types::Log,
    sol_types::SolEvent,
};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// An event that is logged when observed.
pub trait Narrate: SolEvent + Send + 'static {
    /// Logs the event observed on `network`.
    fn narrate(&self, network: &str, log: &Log);
}

impl Narrate for Transfer {
    fn narrate(&self, network: &str, log: &Log) {
        info!(
            network,
            from = %self.from,
            to = %self.to,
            amount = %format_ether(self.value),
            tx_hash = ?log.transaction_hash,
            "Token transfer"
        );
    }
}

impl Narrate for OFTSent {
    fn narrate(&self, network: &str, log: &Log) {
        info!(
            network,
            guid = ?self.guid,
            dst_eid = self.dstEid,
            from = %self.fromAddress,
            sent = %format_ether(self.amountSentLD),
            received = %format_ether(self.amountReceivedLD),
            tx_hash = ?log.transaction_hash,
            "OFT sent"
        );
    }
}

impl Narrate for OFTReceived {
    fn narrate(&self, network: &str, log: &Log) {
        info!(
            network,
            guid = ?self.guid,
            src_eid = self.srcEid,
            to = %self.toAddress,
            amount = %format_ether(self.amountReceivedLD),
            tx_hash = ?log.transaction_hash,
            "OFT received"
        );
    }
}

impl Narrate for DVNFeePaid {
    fn narrate(&self, network: &str, log: &Log) {
        info!(
            network,
            required_dvns = ?self.requiredDVNs,
            optional_dvns = ?self.optionalDVNs,
            fees = ?self.fees,
            tx_hash = ?log.transaction_hash,
            "DVN fee paid"
        );
    }
}

impl Narrate for ExecutorFeePaid {
    fn narrate(&self, network: &str, log: &Log) {
        info!(
            network,
            executor = %self.executor,
            fee = %format_ether(self.fee),
            tx_hash = ?log.transaction_hash,
            "Executor fee paid"
        );
    }
}

impl Narrate for PacketDelivered {
    fn narrate(&self, network: &str, log: &Log) {
        info!(
            network,
            src_eid = self.origin.srcEid,
            sender = ?self.origin.sender,
            nonce = self.origin.nonce,
            receiver = %self.receiver,
            tx_hash = ?log.transaction_hash,
            "Packet delivered"
        );
    }
}

/// One chain together with the relayer for packets leaving it.
#[derive(Debug)]
struct ChainSide {
    connection: Connection,
    settings: RelayerChainSettings,
    relayer: PacketRelayer,
}

/// Listens on both chains and relays packets in both directions.
#[derive(Debug)]
pub struct Listener {
    sides: Vec<ChainSide>,
}

impl Listener {
    /// Connects to both chains of `config`.
    pub async fn connect(config: RelayerConfig) -> Result<Self, RelayError> {
        let RelayerConfig { chains: [a, b], signer } = config;
        let connection_a = Connection::connect(&a.chain, signer.clone()).await?;
        let connection_b = Connection::connect(&b.chain, signer).await?;

        let [relayer_a, relayer_b] = relayers([&connection_a, &connection_b], [&a, &b]);

        Ok(Self {
            sides: vec![
                ChainSide { connection: connection_a, settings: a, relayer: relayer_a },
                ChainSide { connection: connection_b, settings: b, relayer: relayer_b },
            ],
        })
    }

    /// Subscribes to all events and relays packets until a relay fails or a subscription
    /// closes.
    pub async fn run(self) -> Result<(), RelayError> {
        let (errors, mut errors_rx) = mpsc::unbounded_channel();

        for side in &self.sides {
            let network = side.connection.name.clone();
            let endpoint = side.settings.chain.endpoint;

            let mut packets = subscribe::<PacketSent>(&side.connection, endpoint).await?;
            let relayer = side.relayer.clone();
            let errors_tx = errors.clone();
            tokio::spawn(async move {
                while let Some((event, log)) = packets.next().await {
                    debug!(
                        network = %relayer.source_network(),
                        tx_hash = ?log.transaction_hash,
                        "PacketSent observed"
                    );
                    let relayer = relayer.clone();
                    let errors_tx = errors_tx.clone();
                    tokio::spawn(async move {
                        if let Err(err) = relayer.relay(&event).await {
                            let _ = errors_tx.send(err);
                        }
                    });
                }
                let _ = errors_tx.send(RelayError::SubscriptionClosed {
                    network: relayer.source_network().to_string(),
                    event: PacketSent::SIGNATURE,
                });
            });

            narrate::<PacketDelivered>(&side.connection, endpoint, errors.clone()).await?;
            narrate::<DVNFeePaid>(&side.connection, side.settings.send_library, errors.clone())
                .await?;
            narrate::<ExecutorFeePaid>(&side.connection, side.settings.send_library, errors.clone())
                .await?;
            if let Some(token) = side.settings.chain.token {
                narrate::<Transfer>(&side.connection, token, errors.clone()).await?;
                narrate::<OFTSent>(&side.connection, token, errors.clone()).await?;
                narrate::<OFTReceived>(&side.connection, token, errors.clone()).await?;
            }

            info!(%network, %endpoint, "Listening for packets");
        }
        drop(errors);

        match errors_rx.recv().await {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Relayers for packets leaving chain A and chain B, each delivering to the other chain.
fn relayers(
    connections: [&Connection; 2],
    settings: [&RelayerChainSettings; 2],
) -> [PacketRelayer; 2] {
    [
        PacketRelayer::new(&settings[0].chain.name, destination(connections[1], settings[1])),
        PacketRelayer::new(&settings[1].chain.name, destination(connections[0], settings[0])),
    ]
}

/// Builds the delivery roles of the chain behind `connection`.
fn destination(connection: &Connection, settings: &RelayerChainSettings) -> Destination {
    let rpc = rpc_destination(connection, settings);
    Destination::from_rpc(&settings.chain.name, settings.chain.eid, rpc)
        .with_expected(settings.receive_library, settings.dvn)
}

fn rpc_destination(connection: &Connection, settings: &RelayerChainSettings) -> RpcDestination {
    RpcDestination::new(
        connection.provider().clone(),
        settings.chain.endpoint,
        settings.endpoint_view,
    )
}

/// Spawns a task logging every `E` emitted by `address`.
async fn narrate<E: Narrate>(
    connection: &Connection,
    address: Address,
    errors: mpsc::UnboundedSender<RelayError>,
) -> Result<(), RelayError> {
    let mut events = subscribe::<E>(connection, address).await?;
    let network = connection.name.clone();
    tokio::spawn(async move {
        while let Some((event, log)) = events.next().await {
            event.narrate(&network, &log);
        }
        let _ = errors.send(RelayError::SubscriptionClosed { network, event: E::SIGNATURE });
    });
    Ok(())
}
