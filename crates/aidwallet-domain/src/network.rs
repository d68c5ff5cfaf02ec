//! Stellar network selector.

use serde::{Deserialize, Serialize};

/// Network the wallet contracts are deployed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Testnet,
    Futurenet,
    Standalone,
    Public,
}

/// Error returned for an unrecognised `STELLAR_NETWORK` value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid network {0:?}: expected testnet, futurenet, standalone, public or mainnet")]
pub struct UnknownNetwork(pub String);

impl Network {
    /// Passphrase that domain-separates signatures and contract ids per network.
    pub fn passphrase(self) -> &'static str {
        match self {
            Self::Testnet => "Test SDF Network ; September 2015",
            Self::Futurenet => "Test SDF Future Network ; October 2022",
            Self::Standalone => "Standalone Network ; February 2017",
            Self::Public => "Public Global Stellar Network ; September 2015",
        }
    }

    /// Default friendbot endpoint. Only the SDF test networks run one.
    pub fn default_friendbot_url(self) -> Option<&'static str> {
        match self {
            Self::Testnet => Some("https://friendbot.stellar.org"),
            Self::Futurenet => Some("https://friendbot-futurenet.stellar.org"),
            Self::Standalone | Self::Public => None,
        }
    }
}

impl std::str::FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" => Ok(Self::Testnet),
            "futurenet" => Ok(Self::Futurenet),
            "standalone" => Ok(Self::Standalone),
            "public" | "mainnet" => Ok(Self::Public),
            _ => Err(UnknownNetwork(s.to_owned())),
        }
    }
}
