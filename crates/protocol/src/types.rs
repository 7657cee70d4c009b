use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{MAINNET_SEED_URL, TESTNET_SEED_URL};

/// Chain the signer reported the signature for.
///
/// Serialized as the bare numeric chain id, as the signer sends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub enum ChainId {
    EthereumMainnet,
    EthereumRopsten,
    EthereumGoerli,
    EthereumSepolia,
    Other(u64),
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        match id {
            1 => Self::EthereumMainnet,
            3 => Self::EthereumRopsten,
            5 => Self::EthereumGoerli,
            11_155_111 => Self::EthereumSepolia,
            other => Self::Other(other),
        }
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        match id {
            ChainId::EthereumMainnet => 1,
            ChainId::EthereumRopsten => 3,
            ChainId::EthereumGoerli => 5,
            ChainId::EthereumSepolia => 11_155_111,
            ChainId::Other(other) => other,
        }
    }
}

impl ChainId {
    /// Network name used in shareable scene links.
    ///
    /// Unknown chains are reported as mainnet.
    pub fn network_name(self) -> &'static str {
        match self {
            Self::EthereumRopsten => "ropsten",
            Self::EthereumGoerli => "goerli",
            Self::EthereumSepolia => "sepolia",
            Self::EthereumMainnet | Self::Other(_) => "mainnet",
        }
    }

    /// Human-readable chain name for operator output.
    pub fn display_name(self) -> String {
        match self {
            Self::EthereumMainnet => "Ethereum Mainnet".into(),
            Self::EthereumRopsten => "Ethereum Ropsten".into(),
            Self::EthereumGoerli => "Ethereum Goerli".into(),
            Self::EthereumSepolia => "Ethereum Sepolia".into(),
            Self::Other(id) => format!("chain {id}"),
        }
    }
}

/// Content network used when no explicit target is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Sepolia,
}

impl Network {
    /// Catalyst used as the entry point for discovery on this network.
    pub fn seed_url(self) -> &'static str {
        match self {
            Self::Mainnet => MAINNET_SEED_URL,
            Self::Sepolia => TESTNET_SEED_URL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Sepolia => "sepolia",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown network: {0}")]
pub struct ParseNetworkError(String);

impl FromStr for Network {
    type Err = ParseNetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "sepolia" | "testnet" => Ok(Self::Sepolia),
            other => Err(ParseNetworkError(other.to_string())),
        }
    }
}
