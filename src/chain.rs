//! Chain connections.

use crate::config::ChainSettings;
use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::client::ClientBuilder,
    signers::local::PrivateKeySigner,
    transports::TransportResult,
};
use tracing::info;
use url::Url;

/// A signing provider for one chain.
///
/// The provider fills nonce, gas price and chain ID and signs with the configured key.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Network name used in logs.
    pub name: String,
    url: Url,
    provider: DynProvider,
    signer_address: Address,
}

impl Connection {
    /// Connects to `settings.rpc_url`, over WebSocket for `ws(s)://` URLs and HTTP otherwise.
    pub async fn connect(
        settings: &ChainSettings,
        signer: PrivateKeySigner,
    ) -> TransportResult<Self> {
        let signer_address = signer.address();
        let client = ClientBuilder::default().connect(settings.rpc_url.as_str()).await?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_client(client)
            .erased();

        let chain_id = provider.get_chain_id().await?;
        info!(network = %settings.name, chain_id, url = %settings.rpc_url, "Connected");

        Ok(Self::new(settings.name.clone(), settings.rpc_url.clone(), provider, signer_address))
    }

    /// Wraps an already built provider reachable at `url`.
    pub fn new(
        name: impl Into<String>,
        url: Url,
        provider: DynProvider,
        signer_address: Address,
    ) -> Self {
        Self { name: name.into(), url, provider, signer_address }
    }

    /// Whether the connection supports `eth_subscribe`.
    pub fn is_pubsub(&self) -> bool {
        matches!(self.url.scheme(), "ws" | "wss")
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Address transactions are sent from.
    pub fn signer_address(&self) -> Address {
        self.signer_address
    }
}
