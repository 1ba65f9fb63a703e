//! Bridged token setup and transfers.
//!
//! Deploys the OFT token on both chains when absent, wires the two deployments as peers,
//! sets enforced options and sends tokens across.

pub use crate::config::Side;

use crate::{
    chain::Connection,
    config::BridgeConfig,
    constants::{
        MSG_TYPE_SEND, MSG_TYPE_SEND_AND_CALL, OFT_LZ_RECEIVE_GAS, SET_PEER_GAS_LIMIT,
        WRAPPED_TOKEN_GAS_LIMIT,
    },
    layerzero::{
        EndpointId, OptionsBuilder, address_to_bytes32,
        contracts::{EnforcedOptionParam, IBridgedToken, SendParam},
    },
};
use alloy::{
    hex,
    network::Ethereum,
    primitives::{Address, Bytes, TxHash, TxKind, U256, utils::format_ether},
    providers::{DynProvider, PendingTransactionBuilder, PendingTransactionError, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
    sol_types::SolValue,
    transports::{RpcError, TransportErrorKind},
};
use futures_util::future::try_join;
use std::path::PathBuf;
use tracing::info;

/// Errors raised by bridge operations.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The token artifact could not be read.
    #[error("failed to read artifact {path}: {source}")]
    ArtifactRead {
        /// Artifact path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// The token artifact is not valid JSON.
    #[error("failed to parse artifact: {0}")]
    ArtifactParse(#[from] serde_json::Error),
    /// The artifact has no creation bytecode.
    #[error("no bytecode found in artifact")]
    MissingBytecode,
    /// The artifact bytecode is not valid hex.
    #[error("invalid artifact bytecode: {0}")]
    InvalidBytecode(#[from] hex::FromHexError),
    /// A deployment receipt carried no contract address.
    #[error("deployment on {0} did not create a contract")]
    NoContractAddress(String),
    /// An operation needs a token that is neither configured nor deployed.
    #[error("no token deployed on {0}")]
    TokenNotDeployed(String),
    /// The sender still lacks tokens after depositing.
    #[error("insufficient token balance: have {balance}, need {amount}")]
    InsufficientBalance {
        /// Balance after the deposit
        balance: U256,
        /// Amount to send
        amount: U256,
    },
    /// A transaction reverted.
    #[error("{call} transaction {tx_hash} on {network} reverted")]
    Reverted {
        /// Network the transaction was sent on
        network: String,
        /// The contract call that reverted
        call: &'static str,
        /// Hash of the reverted transaction
        tx_hash: TxHash,
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

/// Extracts the creation bytecode from a Hardhat (`bytecode`) or Foundry (`bytecode.object`)
/// artifact.
pub fn parse_artifact(json: &str) -> Result<Bytes, BridgeError> {
    let artifact: serde_json::Value = serde_json::from_str(json)?;
    let bytecode = artifact
        .get("bytecode")
        .and_then(|b| b.as_str().or_else(|| b.get("object").and_then(|o| o.as_str())))
        .filter(|b| !b.trim_start_matches("0x").is_empty())
        .ok_or(BridgeError::MissingBytecode)?;

    Ok(hex::decode(bytecode)?.into())
}

/// The token deployments on both chains.
#[derive(Debug)]
pub struct TokenBridge {
    config: BridgeConfig,
    connections: [Connection; 2],
}

impl TokenBridge {
    /// Connects to both chains of `config`.
    pub async fn connect(config: BridgeConfig) -> Result<Self, BridgeError> {
        let a = Connection::connect(&config.chains[0], config.signer.clone()).await?;
        let b = Connection::connect(&config.chains[1], config.signer.clone()).await?;
        Ok(Self::new(config, [a, b]))
    }

    /// Uses existing connections to chain A and chain B.
    pub fn new(config: BridgeConfig, connections: [Connection; 2]) -> Self {
        Self { config, connections }
    }

    fn network(&self, side: Side) -> &str {
        &self.config.chains[side.index()].name
    }

    fn eid(&self, side: Side) -> EndpointId {
        self.config.chains[side.index()].eid
    }

    fn provider(&self, side: Side) -> &DynProvider {
        self.connections[side.index()].provider()
    }

    /// Token address on `side`.
    pub fn token(&self, side: Side) -> Result<Address, BridgeError> {
        self.config.chains[side.index()]
            .token
            .ok_or_else(|| BridgeError::TokenNotDeployed(self.network(side).to_string()))
    }

    /// Waits for `pending` and fails on revert.
    async fn confirm(
        &self,
        side: Side,
        call: &'static str,
        pending: PendingTransactionBuilder<Ethereum>,
    ) -> Result<TransactionReceipt, BridgeError> {
        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(BridgeError::Reverted {
                network: self.network(side).to_string(),
                call,
                tx_hash: receipt.transaction_hash,
            });
        }
        Ok(receipt)
    }

    /// Deploys the token on every chain without a configured token.
    ///
    /// Returns the token addresses of both chains.
    pub async fn deploy_tokens(&mut self) -> Result<[Address; 2], BridgeError> {
        let mut bytecode: Option<Bytes> = None;

        for side in [Side::A, Side::B] {
            if self.config.chains[side.index()].token.is_some() {
                continue;
            }

            let code = match &bytecode {
                Some(code) => code.clone(),
                None => {
                    let code = self.read_artifact()?;
                    bytecode = Some(code.clone());
                    code
                }
            };
            let owner = self.connections[side.index()].signer_address();
            let args = (
                self.config.token_name.clone(),
                self.config.token_symbol.clone(),
                self.config.chains[side.index()].endpoint,
                owner,
            )
                .abi_encode_params();
            let input = [code.as_ref(), args.as_slice()].concat();

            let pending = self
                .provider(side)
                .send_transaction(TransactionRequest {
                    input: input.into(),
                    to: Some(TxKind::Create),
                    ..Default::default()
                })
                .await?;
            let receipt = self.confirm(side, "deploy", pending).await?;
            let token = receipt
                .contract_address
                .ok_or_else(|| BridgeError::NoContractAddress(self.network(side).to_string()))?;

            info!(
                network = %self.network(side),
                %token,
                tx_hash = ?receipt.transaction_hash,
                "Deployed token, set it in the environment to reuse it"
            );
            self.config.chains[side.index()].token = Some(token);
        }

        Ok([self.token(Side::A)?, self.token(Side::B)?])
    }

    fn read_artifact(&self) -> Result<Bytes, BridgeError> {
        let path = &self.config.artifact;
        let json = std::fs::read_to_string(path)
            .map_err(|source| BridgeError::ArtifactRead { path: path.clone(), source })?;
        parse_artifact(&json)
    }

    /// Makes each token trust the other as its peer.
    pub async fn set_peers(&self) -> Result<(), BridgeError> {
        self.check_and_set_peer(Side::A).await?;
        self.check_and_set_peer(Side::B).await?;
        Ok(())
    }

    /// Sets the token on the other chain as peer of the token on `side`, unless it already is.
    ///
    /// Returns whether a transaction was sent.
    pub async fn check_and_set_peer(&self, side: Side) -> Result<bool, BridgeError> {
        let token = IBridgedToken::new(self.token(side)?, self.provider(side));
        let peer_eid = self.eid(side.other());
        let peer = address_to_bytes32(self.token(side.other())?);

        if token.isPeer(peer_eid, peer).call().await? {
            info!(network = %self.network(side), %peer, "Peer already set");
            return Ok(false);
        }

        info!(network = %self.network(side), "Peer missing or incorrect");
        let pending = token.setPeer(peer_eid, peer).gas(SET_PEER_GAS_LIMIT).send().await?;
        let receipt = self.confirm(side, "setPeer", pending).await?;
        info!(
            network = %self.network(side),
            %peer,
            tx_hash = ?receipt.transaction_hash,
            block = ?receipt.block_number,
            "Peer set"
        );
        Ok(true)
    }

    /// Enforced options of the token on `side` for messages to the other chain.
    pub fn enforced_options(&self, side: Side) -> Vec<EnforcedOptionParam> {
        let eid = self.eid(side.other());
        vec![
            EnforcedOptionParam {
                eid,
                msgType: MSG_TYPE_SEND,
                options: OptionsBuilder::new()
                    .add_executor_lz_receive_option(OFT_LZ_RECEIVE_GAS, 0)
                    .build(),
            },
            EnforcedOptionParam { eid, msgType: MSG_TYPE_SEND_AND_CALL, options: Bytes::new() },
        ]
    }

    /// Sets the enforced options of the token on `side`.
    pub async fn set_enforced_options(&self, side: Side) -> Result<TxHash, BridgeError> {
        let token = IBridgedToken::new(self.token(side)?, self.provider(side));
        let pending = token.setEnforcedOptions(self.enforced_options(side)).send().await?;
        let receipt = self.confirm(side, "setEnforcedOptions", pending).await?;

        info!(
            network = %self.network(side),
            tx_hash = ?receipt.transaction_hash,
            "Enforced options set"
        );
        Ok(receipt.transaction_hash)
    }

    /// Sends `amount` tokens from `side` to `recipient` on the other chain, granting
    /// `lz_receive_gas` to the destination execution.
    pub async fn send_tokens(
        &self,
        side: Side,
        amount: U256,
        recipient: Address,
        lz_receive_gas: u128,
    ) -> Result<TxHash, BridgeError> {
        let token_address = self.token(side)?;
        let token = IBridgedToken::new(token_address, self.provider(side));
        let refund = self.connections[side.index()].signer_address();

        let param = SendParam {
            dstEid: self.eid(side.other()),
            to: address_to_bytes32(recipient),
            amountLD: amount,
            minAmountLD: amount,
            extraOptions: OptionsBuilder::new()
                .add_executor_lz_receive_option(lz_receive_gas, 0)
                .build(),
            composeMsg: Bytes::new(),
            oftCmd: Bytes::new(),
        };

        let fee = token.quoteSend(param.clone(), false).call().await?;
        info!(
            native_fee = %format_ether(fee.nativeFee),
            lz_token_fee = %fee.lzTokenFee,
            "Quoted send"
        );

        let pending = token
            .send(param, fee.clone(), refund)
            .value(fee.nativeFee)
            .gas(WRAPPED_TOKEN_GAS_LIMIT)
            .send()
            .await?;
        let receipt = self.confirm(side, "send", pending).await?;

        info!(
            network = %self.network(side),
            token = %token_address,
            amount = %format_ether(amount),
            %recipient,
            tx_hash = ?receipt.transaction_hash,
            block = ?receipt.block_number,
            "Sent tokens"
        );
        Ok(receipt.transaction_hash)
    }

    /// Wraps native currency as needed and sends `amount` wrapped tokens from `side`.
    pub async fn send_wrapped(
        &self,
        side: Side,
        amount: U256,
        recipient: Address,
    ) -> Result<TxHash, BridgeError> {
        let token = IBridgedToken::new(self.token(side)?, self.provider(side));
        let owner = self.connections[side.index()].signer_address();

        let balance = token.balanceOf(owner).call().await?;
        if amount > balance {
            let deposit = amount - balance;
            let pending =
                token.deposit().value(deposit).gas(WRAPPED_TOKEN_GAS_LIMIT).send().await?;
            let receipt = self.confirm(side, "deposit", pending).await?;
            info!(
                network = %self.network(side),
                amount = %format_ether(deposit),
                tx_hash = ?receipt.transaction_hash,
                block = ?receipt.block_number,
                "Deposited"
            );
        }

        let balance = token.balanceOf(owner).call().await?;
        if amount > balance {
            return Err(BridgeError::InsufficientBalance { balance, amount });
        }

        self.send_tokens(side, amount, recipient, u128::from(WRAPPED_TOKEN_GAS_LIMIT)).await
    }

    /// Total token supply on both chains.
    pub async fn total_supplies(&self) -> Result<[U256; 2], BridgeError> {
        let a = IBridgedToken::new(self.token(Side::A)?, self.provider(Side::A));
        let b = IBridgedToken::new(self.token(Side::B)?, self.provider(Side::B));
        let (supply_a, supply_b) = try_join(
            async { a.totalSupply().call().await },
            async { b.totalSupply().call().await },
        )
        .await?;

        for (side, supply) in [(Side::A, supply_a), (Side::B, supply_b)] {
            info!(network = %self.network(side), supply = %format_ether(supply), "Total supply");
        }
        Ok([supply_a, supply_b])
    }

    /// Token balance of `who` on both chains.
    pub async fn balances_of(&self, who: Address) -> Result<[U256; 2], BridgeError> {
        let a = IBridgedToken::new(self.token(Side::A)?, self.provider(Side::A));
        let b = IBridgedToken::new(self.token(Side::B)?, self.provider(Side::B));
        let (balance_a, balance_b) = try_join(
            async { a.balanceOf(who).call().await },
            async { b.balanceOf(who).call().await },
        )
        .await?;

        for (side, balance) in [(Side::A, balance_a), (Side::B, balance_b)] {
            info!(network = %self.network(side), %who, balance = %format_ether(balance), "Balance");
        }
        Ok([balance_a, balance_b])
    }

    /// Address signing bridge transactions on `side`.
    pub fn signer_address(&self, side: Side) -> Address {
        self.connections[side.index()].signer_address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ChainSettings,
        constants::{DEFAULT_TOKEN_NAME, DEFAULT_TOKEN_SYMBOL},
    };
    use alloy::{
        primitives::{B256, address, bytes},
        providers::ProviderBuilder,
        transports::mock::Asserter,
    };

    // anvil account #0
    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TOKEN_A: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
    const TOKEN_B: Address = address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512");

    fn chain(name: &str, eid: EndpointId, token: Option<Address>) -> ChainSettings {
        ChainSettings {
            name: name.to_string(),
            rpc_url: "http://localhost:8545".parse().unwrap(),
            eid,
            endpoint: address!("0x1a44076050125825900e736c501f859c50fE728c"),
            token,
        }
    }

    fn config(tokens: [Option<Address>; 2], artifact: PathBuf) -> BridgeConfig {
        BridgeConfig {
            chains: [chain("chain-a", 40161, tokens[0]), chain("chain-b", 40245, tokens[1])],
            signer: KEY.parse().unwrap(),
            artifact,
            token_name: DEFAULT_TOKEN_NAME.to_string(),
            token_symbol: DEFAULT_TOKEN_SYMBOL.to_string(),
        }
    }

    /// A bridge whose chains answer from `asserters` in request order. An exhausted
    /// asserter fails every further request.
    fn bridge(config: BridgeConfig, asserters: [&Asserter; 2]) -> TokenBridge {
        let owner = config.signer.address();
        let connections = [Side::A, Side::B].map(|side| {
            let provider = ProviderBuilder::new()
                .disable_recommended_fillers()
                .connect_mocked_client(asserters[side.index()].clone())
                .erased();
            let chain = &config.chains[side.index()];
            Connection::new(chain.name.clone(), chain.rpc_url.clone(), provider, owner)
        });
        TokenBridge::new(config, connections)
    }

    fn missing_artifact() -> PathBuf {
        PathBuf::from("artifacts/missing/WTsscLz.json")
    }

    #[tokio::test]
    async fn existing_peer_is_left_alone() {
        let (asserter_a, asserter_b) = (Asserter::new(), Asserter::new());
        // isPeer
        asserter_a.push_success(&B256::with_last_byte(1));
        let bridge = bridge(
            config([Some(TOKEN_A), Some(TOKEN_B)], missing_artifact()),
            [&asserter_a, &asserter_b],
        );

        assert!(!bridge.check_and_set_peer(Side::A).await.unwrap());
    }

    #[tokio::test]
    async fn missing_peer_is_set() {
        let (asserter_a, asserter_b) = (Asserter::new(), Asserter::new());
        // isPeer
        asserter_b.push_success(&B256::ZERO);
        // setPeer
        asserter_b.push_failure_msg("setPeer rejected on chain-b");
        let bridge = bridge(
            config([Some(TOKEN_A), Some(TOKEN_B)], missing_artifact()),
            [&asserter_a, &asserter_b],
        );

        let err = bridge.check_and_set_peer(Side::B).await.unwrap_err();
        assert!(matches!(err, BridgeError::Contract(_)));
        assert!(err.to_string().contains("setPeer rejected on chain-b"));
    }

    #[tokio::test]
    async fn peers_need_both_tokens() {
        let asserter = Asserter::new();
        let config = config([Some(TOKEN_A), None], missing_artifact());
        let bridge = bridge(config, [&asserter, &asserter]);

        assert!(matches!(
            bridge.check_and_set_peer(Side::A).await,
            Err(BridgeError::TokenNotDeployed(network)) if network == "chain-b"
        ));
    }

    #[tokio::test]
    async fn configured_tokens_are_not_redeployed() {
        let asserter = Asserter::new();
        let config = config([Some(TOKEN_A), Some(TOKEN_B)], missing_artifact());
        let mut bridge = bridge(config, [&asserter, &asserter]);

        // neither the artifact nor the chains are touched
        assert_eq!(bridge.deploy_tokens().await.unwrap(), [TOKEN_A, TOKEN_B]);
    }

    #[tokio::test]
    async fn only_missing_token_is_deployed() {
        let artifact =
            std::env::temp_dir().join(format!("lz-bridge-artifact-{}.json", std::process::id()));
        std::fs::write(&artifact, r#"{"abi":[],"bytecode":"0x6080604052"}"#).unwrap();

        let (asserter_a, asserter_b) = (Asserter::new(), Asserter::new());
        asserter_b.push_failure_msg("deployment rejected on chain-b");
        let config = config([Some(TOKEN_A), None], artifact.clone());
        let mut bridge = bridge(config, [&asserter_a, &asserter_b]);

        let err = bridge.deploy_tokens().await.unwrap_err();
        std::fs::remove_file(&artifact).unwrap();

        assert!(matches!(err, BridgeError::Rpc(_)));
        assert!(err.to_string().contains("deployment rejected on chain-b"));
    }

    #[test]
    fn parses_hardhat_artifact() {
        let json = r#"{"contractName":"WTsscLz","abi":[],"bytecode":"0x6080604052"}"#;
        assert_eq!(parse_artifact(json).unwrap(), bytes!("0x6080604052"));
    }

    #[test]
    fn parses_foundry_artifact() {
        let json = r#"{"abi":[],"bytecode":{"object":"0x6080604052","linkReferences":{}}}"#;
        assert_eq!(parse_artifact(json).unwrap(), bytes!("0x6080604052"));
    }

    #[test]
    fn rejects_artifact_without_bytecode() {
        assert!(matches!(parse_artifact(r#"{"abi":[]}"#), Err(BridgeError::MissingBytecode)));
        assert!(matches!(
            parse_artifact(r#"{"abi":[],"bytecode":"0x"}"#),
            Err(BridgeError::MissingBytecode)
        ));
        assert!(matches!(parse_artifact("not json"), Err(BridgeError::ArtifactParse(_))));
        assert!(matches!(
            parse_artifact(r#"{"bytecode":"0xzz"}"#),
            Err(BridgeError::InvalidBytecode(_))
        ));
    }
}
