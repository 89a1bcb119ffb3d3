use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::sync::Arc;

/// How a chain is observed
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChainType {
    /// CometBFT node polled over HTTP
    Cosmos,
    /// Ethereum node polled through `txpool_content`
    Eth,
    /// Ethereum node streamed over a websocket subscription
    EthSub,
}

impl ChainType {
    pub const fn allowed_schemes(self) -> &'static [&'static str] {
        match self {
            Self::Cosmos | Self::Eth => &["http", "https"],
            Self::EthSub => &["ws", "wss"],
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Cosmos => "Cosmos",
            Self::Eth => "Ethereum",
            Self::EthSub => "Ethereum (subscription)",
        }
    }
}

/// A validated RPC endpoint for a given [`ChainType`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointUrl(Arc<str>);

impl EndpointUrl {
    pub fn new(url: impl Into<String>, chain_type: ChainType) -> Result<Self, String> {
        let url_str = url.into();
        let parsed = url::Url::parse(&url_str).map_err(|e| e.to_string())?;

        let allowed = chain_type.allowed_schemes();
        if !allowed.contains(&parsed.scheme()) {
            return Err(format!(
                "{} endpoints must use one of the schemes: {}",
                chain_type,
                allowed.join(", ")
            ));
        }

        Ok(Self(Arc::from(url_str.as_str())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EndpointUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for EndpointUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
