//! Relay pipeline tests against scripted destination contracts.

use alloy::primitives::{Address, B256, Bytes, TxHash, address, b256, keccak256};
use async_trait::async_trait;
use lz_bridge::{
    error::RelayError,
    layerzero::{
        EndpointId, ExecutionState,
        contracts::{ILayerZeroEndpointV2::PacketSent, Origin, UlnConfig},
    },
    relay::{
        Destination, Dvn, Endpoint, EndpointView, PacketRelayer, ReceiveLibrary, RelayOutcome,
        relay_packet,
    },
};
use parking_lot::Mutex;
use std::{collections::VecDeque, sync::Arc};

const SRC_EID: EndpointId = 40161;
const DST_EID: EndpointId = 40245;
const SENDER: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
const RECEIVER: Address = address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512");
const RECEIVE_LIB: Address = address!("0x00000000000000000000000000000000000000a1");
const DVN: Address = address!("0x00000000000000000000000000000000000000d1");
const GUID: B256 = b256!("0x2222222222222222222222222222222222222222222222222222222222222222");

const VERIFY_TX: TxHash = B256::repeat_byte(0x01);
const COMMIT_TX: TxHash = B256::repeat_byte(0x02);
const LZ_RECEIVE_TX: TxHash = B256::repeat_byte(0x03);

/// A contract call observed by [`MockDestination`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    ReceiveLibrary { receiver: Address, src_eid: EndpointId },
    UlnConfig { library: Address, oapp: Address, src_eid: EndpointId },
    Executable { nonce: u64 },
    Verify { dvn: Address, library: Address, header: Bytes, payload_hash: B256, confirmations: u64 },
    Verifiable { library: Address, header_hash: B256, payload_hash: B256 },
    Commit { library: Address, header: Bytes, payload_hash: B256 },
    LzReceive { receiver: Address, guid: B256, message: Bytes },
}

/// Destination chain whose contract answers are scripted.
#[derive(Debug)]
struct MockDestination {
    calls: Mutex<Vec<Call>>,
    /// Answers of consecutive `executable` queries. Defaults to `NotExecutable` once drained.
    states: Mutex<VecDeque<ExecutionState>>,
    verifiable: bool,
    required_dvns: Vec<Address>,
    fail_verify: bool,
}

impl MockDestination {
    fn new(states: impl IntoIterator<Item = ExecutionState>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            states: Mutex::new(states.into_iter().collect()),
            verifiable: true,
            required_dvns: vec![DVN],
            fail_verify: false,
        }
    }

    fn with_verifiable(mut self, verifiable: bool) -> Self {
        self.verifiable = verifiable;
        self
    }

    fn with_required_dvns(mut self, dvns: Vec<Address>) -> Self {
        self.required_dvns = dvns;
        self
    }

    fn failing_verify(mut self) -> Self {
        self.fail_verify = true;
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn called(&self, matcher: impl Fn(&Call) -> bool) -> bool {
        self.calls.lock().iter().any(matcher)
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl Endpoint for MockDestination {
    async fn receive_library(
        &self,
        receiver: Address,
        src_eid: EndpointId,
    ) -> Result<Address, RelayError> {
        self.record(Call::ReceiveLibrary { receiver, src_eid });
        Ok(RECEIVE_LIB)
    }

    async fn lz_receive(
        &self,
        _origin: Origin,
        receiver: Address,
        guid: B256,
        message: Bytes,
    ) -> Result<TxHash, RelayError> {
        self.record(Call::LzReceive { receiver, guid, message });
        Ok(LZ_RECEIVE_TX)
    }
}

#[async_trait]
impl EndpointView for MockDestination {
    async fn executable(
        &self,
        origin: &Origin,
        _receiver: Address,
    ) -> Result<ExecutionState, RelayError> {
        self.record(Call::Executable { nonce: origin.nonce });
        Ok(self.states.lock().pop_front().unwrap_or(ExecutionState::NotExecutable))
    }
}

#[async_trait]
impl ReceiveLibrary for MockDestination {
    async fn uln_config(
        &self,
        library: Address,
        oapp: Address,
        src_eid: EndpointId,
    ) -> Result<UlnConfig, RelayError> {
        self.record(Call::UlnConfig { library, oapp, src_eid });
        Ok(UlnConfig {
            confirmations: 15,
            requiredDVNCount: self.required_dvns.len() as u8,
            optionalDVNCount: 0,
            optionalDVNThreshold: 0,
            requiredDVNs: self.required_dvns.clone(),
            optionalDVNs: vec![],
        })
    }

    async fn verifiable(
        &self,
        library: Address,
        _config: &UlnConfig,
        header_hash: B256,
        payload_hash: B256,
    ) -> Result<bool, RelayError> {
        self.record(Call::Verifiable { library, header_hash, payload_hash });
        Ok(self.verifiable)
    }

    async fn commit_verification(
        &self,
        library: Address,
        header: Bytes,
        payload_hash: B256,
    ) -> Result<TxHash, RelayError> {
        self.record(Call::Commit { library, header, payload_hash });
        Ok(COMMIT_TX)
    }
}

#[async_trait]
impl Dvn for MockDestination {
    async fn verify(
        &self,
        dvn: Address,
        receive_library: Address,
        header: Bytes,
        payload_hash: B256,
        confirmations: u64,
    ) -> Result<TxHash, RelayError> {
        self.record(Call::Verify {
            dvn,
            library: receive_library,
            header,
            payload_hash,
            confirmations,
        });
        if self.fail_verify {
            return Err(RelayError::Reverted { call: "verify", tx_hash: VERIFY_TX });
        }
        Ok(VERIFY_TX)
    }
}

fn destination(mock: &Arc<MockDestination>) -> Destination {
    Destination {
        network: "chain-b".to_string(),
        eid: DST_EID,
        endpoint: mock.clone(),
        view: mock.clone(),
        receive_library: mock.clone(),
        dvn: mock.clone(),
        expected_receive_library: Some(RECEIVE_LIB),
        expected_dvn: None,
    }
}

fn encoded_packet(nonce: u64, message: &[u8]) -> Vec<u8> {
    let mut out = vec![1u8];
    out.extend_from_slice(&nonce.to_be_bytes());
    out.extend_from_slice(&SRC_EID.to_be_bytes());
    out.extend_from_slice(SENDER.into_word().as_slice());
    out.extend_from_slice(&DST_EID.to_be_bytes());
    out.extend_from_slice(RECEIVER.into_word().as_slice());
    out.extend_from_slice(GUID.as_slice());
    out.extend_from_slice(message);
    out
}

fn packet_sent(encoded: &[u8]) -> PacketSent {
    PacketSent {
        encodedPayload: Bytes::copy_from_slice(encoded),
        options: Bytes::new(),
        sendLibrary: Address::ZERO,
    }
}

#[tokio::test]
async fn happy_path_verifies_commits_and_delivers() {
    let mock = Arc::new(MockDestination::new([
        ExecutionState::NotExecutable,
        ExecutionState::NotExecutable,
        ExecutionState::Executable,
    ]));
    let encoded = encoded_packet(1, b"transfer");
    let header = Bytes::copy_from_slice(&encoded[..81]);
    let payload_hash = keccak256(&encoded[81..]);

    let outcome = relay_packet("chain-a", &destination(&mock), &packet_sent(&encoded)).await.unwrap();

    assert_eq!(outcome, RelayOutcome::Delivered { tx_hash: LZ_RECEIVE_TX });
    assert_eq!(
        mock.calls(),
        vec![
            Call::ReceiveLibrary { receiver: RECEIVER, src_eid: SRC_EID },
            Call::UlnConfig { library: RECEIVE_LIB, oapp: RECEIVER, src_eid: SRC_EID },
            Call::Executable { nonce: 1 },
            Call::Verify {
                dvn: DVN,
                library: RECEIVE_LIB,
                header: header.clone(),
                payload_hash,
                confirmations: 15,
            },
            Call::Executable { nonce: 1 },
            Call::Verifiable {
                library: RECEIVE_LIB,
                header_hash: keccak256(&encoded[..81]),
                payload_hash,
            },
            Call::Commit { library: RECEIVE_LIB, header, payload_hash },
            Call::Executable { nonce: 1 },
            Call::LzReceive {
                receiver: RECEIVER,
                guid: GUID,
                message: Bytes::from_static(b"transfer"),
            },
        ]
    );
}

#[tokio::test]
async fn unverifiable_packet_is_not_committed() {
    let mock = Arc::new(MockDestination::new([]).with_verifiable(false));
    let encoded = encoded_packet(2, b"transfer");

    let outcome = relay_packet("chain-a", &destination(&mock), &packet_sent(&encoded)).await.unwrap();

    assert_eq!(outcome, RelayOutcome::NotVerifiable);
    assert!(mock.called(|c| matches!(c, Call::Verify { .. })));
    assert!(!mock.called(|c| matches!(c, Call::Commit { .. })));
    assert!(!mock.called(|c| matches!(c, Call::LzReceive { .. })));
}

#[tokio::test]
async fn executable_packet_skips_verification() {
    let mock = Arc::new(MockDestination::new([ExecutionState::Executable]));
    let encoded = encoded_packet(3, b"transfer");

    let outcome = relay_packet("chain-a", &destination(&mock), &packet_sent(&encoded)).await.unwrap();

    assert_eq!(outcome, RelayOutcome::Delivered { tx_hash: LZ_RECEIVE_TX });
    assert!(!mock.called(|c| matches!(c, Call::Verify { .. })));
    assert!(!mock.called(|c| matches!(c, Call::Verifiable { .. })));
    assert!(!mock.called(|c| matches!(c, Call::Commit { .. })));
    assert!(mock.called(|c| matches!(c, Call::LzReceive { .. })));
}

#[tokio::test]
async fn packet_not_executable_after_commit_is_not_delivered() {
    let mock = Arc::new(MockDestination::new([
        ExecutionState::NotExecutable,
        ExecutionState::NotExecutable,
        ExecutionState::VerifiedButNotExecutable,
    ]));
    let encoded = encoded_packet(4, b"transfer");

    let outcome = relay_packet("chain-a", &destination(&mock), &packet_sent(&encoded)).await.unwrap();

    assert_eq!(
        outcome,
        RelayOutcome::NotExecutable { state: ExecutionState::VerifiedButNotExecutable }
    );
    assert!(mock.called(|c| matches!(c, Call::Commit { .. })));
    assert!(!mock.called(|c| matches!(c, Call::LzReceive { .. })));
}

#[tokio::test]
async fn verified_but_not_executable_is_verified_again() {
    let mock = Arc::new(MockDestination::new([
        ExecutionState::VerifiedButNotExecutable,
        ExecutionState::VerifiedButNotExecutable,
        ExecutionState::Executable,
    ]));
    let encoded = encoded_packet(5, b"transfer");

    let outcome = relay_packet("chain-a", &destination(&mock), &packet_sent(&encoded)).await.unwrap();

    assert!(outcome.is_delivered());
    assert!(mock.called(|c| matches!(c, Call::Verify { .. })));
    assert!(mock.called(|c| matches!(c, Call::Commit { .. })));
}

#[tokio::test]
async fn missing_required_dvn_stops_before_verification() {
    let mock = Arc::new(MockDestination::new([]).with_required_dvns(vec![]));
    let encoded = encoded_packet(6, b"transfer");

    let outcome = relay_packet("chain-a", &destination(&mock), &packet_sent(&encoded)).await.unwrap();

    assert_eq!(outcome, RelayOutcome::NoRequiredDvn);
    assert!(!mock.called(|c| matches!(c, Call::Verify { .. })));
}

#[tokio::test]
async fn executed_packet_is_left_alone() {
    let mock = Arc::new(MockDestination::new([ExecutionState::Executed]));
    let encoded = encoded_packet(7, b"transfer");

    let outcome = relay_packet("chain-a", &destination(&mock), &packet_sent(&encoded)).await.unwrap();

    assert_eq!(outcome, RelayOutcome::AlreadyExecuted);
    assert_eq!(mock.calls().len(), 3);
}

#[tokio::test]
async fn malformed_packet_is_an_error() {
    let mock = Arc::new(MockDestination::new([]));
    let encoded = encoded_packet(8, b"");

    let err = relay_packet("chain-a", &destination(&mock), &packet_sent(&encoded[..90]))
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Decode(_)));
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn failed_verification_propagates() {
    let mock = Arc::new(MockDestination::new([]).failing_verify());
    let encoded = encoded_packet(9, b"transfer");

    let err = relay_packet("chain-a", &destination(&mock), &packet_sent(&encoded))
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Reverted { call: "verify", .. }));
    assert!(!mock.called(|c| matches!(c, Call::Commit { .. })));
}

#[tokio::test]
async fn relayer_relays_to_its_destination() {
    let mock = Arc::new(MockDestination::new([ExecutionState::Executable]));
    let relayer = PacketRelayer::new("chain-a", destination(&mock));
    let encoded = encoded_packet(10, b"transfer");

    assert_eq!(relayer.source_network(), "chain-a");
    assert_eq!(relayer.destination().eid, DST_EID);

    let outcome = relayer.relay(&packet_sent(&encoded)).await.unwrap();
    assert_eq!(outcome, RelayOutcome::Delivered { tx_hash: LZ_RECEIVE_TX });
}
