//! Event subscriptions.

use crate::chain::Connection;
use alloy::{
    primitives::Address,
    providers::Provider,
    rpc::types::{Filter, Log},
    sol_types::SolEvent,
    transports::TransportResult,
};
use futures_util::{Stream, StreamExt, stream};
use std::pin::Pin;
use tracing::debug;

/// Stream of decoded events together with the log they came from.
///
/// Dropping the stream cancels the subscription.
pub type EventStream<E> = Pin<Box<dyn Stream<Item = (E, Log)> + Send>>;

/// Subscribes to `E` events emitted by `address`.
///
/// WebSocket connections use `eth_subscribe`, HTTP connections poll a log filter.
pub async fn subscribe<E>(connection: &Connection, address: Address) -> TransportResult<EventStream<E>>
where
    E: SolEvent + Send + 'static,
{
    let filter = Filter::new().address(address).event_signature(E::SIGNATURE_HASH);
    let provider = connection.provider();

    let logs: Pin<Box<dyn Stream<Item = Log> + Send>> = if connection.is_pubsub() {
        Box::pin(provider.subscribe_logs(&filter).await?.into_stream())
    } else {
        Box::pin(provider.watch_logs(&filter).await?.into_stream().flat_map(stream::iter))
    };

    debug!(network = %connection.name, event = E::SIGNATURE, %address, "Subscribed");

    Ok(Box::pin(logs.filter_map(|log| async move {
        match E::decode_log(&log.inner) {
            Ok(event) => Some((event.data, log)),
            Err(err) => {
                debug!(event = E::SIGNATURE, ?err, "Skipping undecodable log");
                None
            }
        }
    })))
}
