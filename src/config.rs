//! Bridge and relayer configuration.
//!
//! Both binaries are configured from environment variables. Chain A reads variables prefixed
//! with `SRC_`, chain B those prefixed with `DST_`.
use crate::{
    constants::{DEFAULT_TOKEN_NAME, DEFAULT_TOKEN_SYMBOL},
    layerzero::EndpointId,
};
use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use clap::ValueEnum;
use std::{fmt::Display, path::PathBuf, str::FromStr};
use strum::Display as StrumDisplay;
use url::Url;

/// One of the two bridged chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, StrumDisplay)]
pub enum Side {
    /// The `SRC_` chain.
    A,
    /// The `DST_` chain.
    B,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Prefix of this chain's environment variables.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::A => "SRC",
            Self::B => "DST",
        }
    }

    fn default_network_name(self) -> &'static str {
        match self {
            Self::A => "chain-a",
            Self::B => "chain-b",
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing environment variable {0}")]
    Missing(String),
    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name
        name: String,
        /// Parser error message
        reason: String,
    },
}

/// Source of configuration variables.
pub trait Env {
    /// Returns the value of `name`, if set.
    fn var(&self, name: &str) -> Option<String>;

    /// Reads and parses a required variable. Empty values count as missing.
    fn required<T>(&self, name: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.optional(name)?.ok_or_else(|| ConfigError::Missing(name.to_string()))
    }

    /// Reads and parses an optional variable. Empty values count as unset.
    fn optional<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(value) = self.var(name).filter(|v| !v.trim().is_empty()) else {
            return Ok(None);
        };
        value.trim().parse().map(Some).map_err(|err: T::Err| ConfigError::Invalid {
            name: name.to_string(),
            reason: err.to_string(),
        })
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Env for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl<F> Env for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Per-chain settings shared by the bridge and the relayer.
#[derive(Debug, Clone)]
pub struct ChainSettings {
    /// Human readable network name used in logs.
    pub name: String,
    /// RPC endpoint, `http(s)://` or `ws(s)://`.
    pub rpc_url: Url,
    /// LayerZero endpoint ID of this chain.
    pub eid: EndpointId,
    /// EndpointV2 address.
    pub endpoint: Address,
    /// Bridged token address. `None` when unset or zero.
    pub token: Option<Address>,
}

impl ChainSettings {
    /// Loads the settings of the chain on `side`.
    pub fn from_env(env: &impl Env, side: Side) -> Result<Self, ConfigError> {
        let prefix = side.prefix();
        let name = env
            .optional(&format!("{prefix}_NETWORK_NAME"))?
            .unwrap_or_else(|| side.default_network_name().to_string());

        Ok(Self {
            name,
            rpc_url: env.required(&format!("{prefix}_RPC_URL"))?,
            eid: env.required(&format!("{prefix}_ENDPOINT_V2_ID"))?,
            endpoint: env.required(&format!("{prefix}_ENDPOINT_V2"))?,
            token: env
                .optional::<Address>(&format!("{prefix}_CONTRACT"))?
                .filter(|addr| !addr.is_zero()),
        })
    }
}

/// Relayer settings of one chain.
#[derive(Debug, Clone)]
pub struct RelayerChainSettings {
    /// Common chain settings.
    pub chain: ChainSettings,
    /// EndpointV2View address.
    pub endpoint_view: Address,
    /// SendUln302 address, watched for fee events.
    pub send_library: Address,
    /// Expected ReceiveUln302 address.
    pub receive_library: Option<Address>,
    /// Expected DVN address.
    pub dvn: Option<Address>,
}

impl RelayerChainSettings {
    fn from_env(env: &impl Env, side: Side) -> Result<Self, ConfigError> {
        let prefix = side.prefix();
        Ok(Self {
            chain: ChainSettings::from_env(env, side)?,
            endpoint_view: env.required(&format!("{prefix}_ENDPOINT_V2_VIEW"))?,
            send_library: env.required(&format!("{prefix}_SEND_ULN302"))?,
            receive_library: env.optional(&format!("{prefix}_RECEIVE_ULN302"))?,
            dvn: env.optional(&format!("{prefix}_DVN"))?,
        })
    }
}

/// Relayer configuration.
#[derive(Debug, Clone)]
pub struct RelayerConfig {
    /// Chain A and chain B.
    pub chains: [RelayerChainSettings; 2],
    /// Key signing DVN, commit and execution transactions on both chains.
    pub signer: PrivateKeySigner,
}

impl RelayerConfig {
    /// Loads the relayer configuration.
    pub fn from_env(env: &impl Env) -> Result<Self, ConfigError> {
        Ok(Self {
            chains: [
                RelayerChainSettings::from_env(env, Side::A)?,
                RelayerChainSettings::from_env(env, Side::B)?,
            ],
            signer: env.required("PRIVATE_KEY")?,
        })
    }
}

/// Bridge utility configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Chain A and chain B.
    pub chains: [ChainSettings; 2],
    /// Key deploying and operating the tokens.
    pub signer: PrivateKeySigner,
    /// Compiled token artifact (Hardhat or Foundry JSON).
    pub artifact: PathBuf,
    /// Token name passed to the constructor.
    pub token_name: String,
    /// Token symbol passed to the constructor.
    pub token_symbol: String,
}

impl BridgeConfig {
    /// Loads the bridge configuration.
    pub fn from_env(env: &impl Env) -> Result<Self, ConfigError> {
        Ok(Self {
            chains: [
                ChainSettings::from_env(env, Side::A)?,
                ChainSettings::from_env(env, Side::B)?,
            ],
            signer: env.required("PRIVATE_KEY")?,
            artifact: env.required("TOKEN_ARTIFACT")?,
            token_name: env
                .optional("TOKEN_NAME")?
                .unwrap_or_else(|| DEFAULT_TOKEN_NAME.to_string()),
            token_symbol: env
                .optional("TOKEN_SYMBOL")?
                .unwrap_or_else(|| DEFAULT_TOKEN_SYMBOL.to_string()),
        })
    }

    /// Sets the token address of the chain on `side`.
    pub fn with_token(mut self, side: Side, token: Address) -> Self {
        self.chains[side.index()].token = Some(token);
        self
    }
}
