//! Destination-chain contract roles used by the relay pipeline.

use crate::{
    constants::RELAY_TX_GAS_LIMIT,
    error::RelayError,
    layerzero::{
        EndpointId, ExecutionState,
        contracts::{IDVN, IEndpointV2View, ILayerZeroEndpointV2, IReceiveUln302, Origin, UlnConfig},
    },
};
use alloy::{
    primitives::{Address, B256, Bytes, TxHash},
    providers::{DynProvider, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
    sol_types::SolCall,
};
use async_trait::async_trait;
use std::fmt::Debug;
use tracing::debug;

/// The destination EndpointV2.
#[async_trait]
pub trait Endpoint: Send + Sync + Debug {
    /// Receive library configured for `receiver` and messages from `src_eid`.
    async fn receive_library(
        &self,
        receiver: Address,
        src_eid: EndpointId,
    ) -> Result<Address, RelayError>;

    /// Executes a verified message on its receiver.
    async fn lz_receive(
        &self,
        origin: Origin,
        receiver: Address,
        guid: B256,
        message: Bytes,
    ) -> Result<TxHash, RelayError>;
}

/// The destination EndpointV2View.
#[async_trait]
pub trait EndpointView: Send + Sync + Debug {
    /// Execution state of the packet identified by `origin` on `receiver`.
    async fn executable(
        &self,
        origin: &Origin,
        receiver: Address,
    ) -> Result<ExecutionState, RelayError>;
}

/// A ReceiveUln302 deployment.
#[async_trait]
pub trait ReceiveLibrary: Send + Sync + Debug {
    /// ULN config of `oapp` for messages from `src_eid`.
    async fn uln_config(
        &self,
        library: Address,
        oapp: Address,
        src_eid: EndpointId,
    ) -> Result<UlnConfig, RelayError>;

    /// Whether enough DVNs have attested to `payload_hash` under `config`.
    async fn verifiable(
        &self,
        library: Address,
        config: &UlnConfig,
        header_hash: B256,
        payload_hash: B256,
    ) -> Result<bool, RelayError>;

    /// Commits the verification to the endpoint.
    async fn commit_verification(
        &self,
        library: Address,
        header: Bytes,
        payload_hash: B256,
    ) -> Result<TxHash, RelayError>;
}

/// A DVN.
#[async_trait]
pub trait Dvn: Send + Sync + Debug {
    /// Attests `payload_hash` for `header` on `receive_library`.
    async fn verify(
        &self,
        dvn: Address,
        receive_library: Address,
        header: Bytes,
        payload_hash: B256,
        confirmations: u64,
    ) -> Result<TxHash, RelayError>;
}

/// Contract roles backed by a destination-chain provider.
#[derive(Debug, Clone)]
pub struct RpcDestination {
    provider: DynProvider,
    endpoint: Address,
    endpoint_view: Address,
    gas_limit: u64,
}

impl RpcDestination {
    /// Creates the roles for the given endpoint and endpoint view.
    pub fn new(provider: DynProvider, endpoint: Address, endpoint_view: Address) -> Self {
        Self { provider, endpoint, endpoint_view, gas_limit: RELAY_TX_GAS_LIMIT }
    }

    /// EndpointV2 address.
    pub fn endpoint(&self) -> Address {
        self.endpoint
    }

    /// EndpointV2View address.
    pub fn endpoint_view(&self) -> Address {
        self.endpoint_view
    }

    /// Transaction calling `call` on `to` with the relay gas limit.
    fn request<C: SolCall>(&self, to: Address, call: &C) -> TransactionRequest {
        TransactionRequest::default()
            .to(to)
            .input(call.abi_encode().into())
            .gas_limit(self.gas_limit)
    }

    /// `lzReceive` of a verified message, without extra data.
    fn lz_receive_request(
        &self,
        origin: Origin,
        receiver: Address,
        guid: B256,
        message: Bytes,
    ) -> TransactionRequest {
        self.request(
            self.endpoint,
            &ILayerZeroEndpointV2::lzReceiveCall {
                _origin: origin,
                _receiver: receiver,
                _guid: guid,
                _message: message,
                _extraData: Bytes::new(),
            },
        )
    }

    /// Sends `tx` and waits for the receipt. Reverts are errors.
    async fn submit(
        &self,
        call: &'static str,
        tx: TransactionRequest,
    ) -> Result<TxHash, RelayError> {
        let receipt = self.provider.send_transaction(tx).await?.get_receipt().await?;
        let tx_hash = ensure_success(call, &receipt)?;

        debug!(call, ?tx_hash, block = ?receipt.block_number, "Transaction included");
        Ok(tx_hash)
    }
}

/// Hash of the transaction behind `receipt`, or [`RelayError::Reverted`] if it failed.
fn ensure_success(call: &'static str, receipt: &TransactionReceipt) -> Result<TxHash, RelayError> {
    if !receipt.status() {
        return Err(RelayError::Reverted { call, tx_hash: receipt.transaction_hash });
    }
    Ok(receipt.transaction_hash)
}

#[async_trait]
impl Endpoint for RpcDestination {
    async fn receive_library(
        &self,
        receiver: Address,
        src_eid: EndpointId,
    ) -> Result<Address, RelayError> {
        let endpoint = ILayerZeroEndpointV2::new(self.endpoint, &self.provider);
        Ok(endpoint.getReceiveLibrary(receiver, src_eid).call().await?.lib)
    }

    async fn lz_receive(
        &self,
        origin: Origin,
        receiver: Address,
        guid: B256,
        message: Bytes,
    ) -> Result<TxHash, RelayError> {
        let tx = self.lz_receive_request(origin, receiver, guid, message);
        self.submit(ILayerZeroEndpointV2::lzReceiveCall::SIGNATURE, tx).await
    }
}

#[async_trait]
impl EndpointView for RpcDestination {
    async fn executable(
        &self,
        origin: &Origin,
        receiver: Address,
    ) -> Result<ExecutionState, RelayError> {
        let view = IEndpointV2View::new(self.endpoint_view, &self.provider);
        let state = view.executable(origin.clone(), receiver).call().await?;
        ExecutionState::try_from(state).map_err(RelayError::UnknownExecutionState)
    }
}

#[async_trait]
impl ReceiveLibrary for RpcDestination {
    async fn uln_config(
        &self,
        library: Address,
        oapp: Address,
        src_eid: EndpointId,
    ) -> Result<UlnConfig, RelayError> {
        let library = IReceiveUln302::new(library, &self.provider);
        Ok(library.getUlnConfig(oapp, src_eid).call().await?)
    }

    async fn verifiable(
        &self,
        library: Address,
        config: &UlnConfig,
        header_hash: B256,
        payload_hash: B256,
    ) -> Result<bool, RelayError> {
        let library = IReceiveUln302::new(library, &self.provider);
        Ok(library.verifiable(config.clone(), header_hash, payload_hash).call().await?)
    }

    async fn commit_verification(
        &self,
        library: Address,
        header: Bytes,
        payload_hash: B256,
    ) -> Result<TxHash, RelayError> {
        let call = IReceiveUln302::commitVerificationCall {
            _packetHeader: header,
            _payloadHash: payload_hash,
        };
        self.submit(IReceiveUln302::commitVerificationCall::SIGNATURE, self.request(library, &call))
            .await
    }
}

#[async_trait]
impl Dvn for RpcDestination {
    async fn verify(
        &self,
        dvn: Address,
        receive_library: Address,
        header: Bytes,
        payload_hash: B256,
        confirmations: u64,
    ) -> Result<TxHash, RelayError> {
        let call = IDVN::verifyCall {
            _receiveLib: receive_library,
            _packetHeader: header,
            _payloadHash: payload_hash,
            _confirmations: confirmations,
        };
        self.submit(IDVN::verifyCall::SIGNATURE, self.request(dvn, &call)).await
    }
}
