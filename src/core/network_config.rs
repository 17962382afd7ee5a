use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

/// Network environment enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// Devnet, reset regularly
    Devnet,
    /// Testnet environment with faucet funded accounts
    Testnet,
    /// Mainnet environment - real assets
    Mainnet,
}

/// Network configuration including REST endpoint and explorer links
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub network_type: NetworkType,
    pub fullnode_url: &'static str,
    pub explorer_url: &'static str,
}

impl NetworkConfig {
    /// Devnet configuration
    const DEVNET: NetworkConfig = NetworkConfig {
        network_type: NetworkType::Devnet,
        fullnode_url: "https://api.devnet.aptoslabs.com/v1",
        explorer_url: "https://explorer.aptoslabs.com",
    };

    /// Testnet configuration
    const TESTNET: NetworkConfig = NetworkConfig {
        network_type: NetworkType::Testnet,
        fullnode_url: "https://api.testnet.aptoslabs.com/v1",
        explorer_url: "https://explorer.aptoslabs.com",
    };

    /// Mainnet configuration
    const MAINNET: NetworkConfig = NetworkConfig {
        network_type: NetworkType::Mainnet,
        fullnode_url: "https://api.mainnet.aptoslabs.com/v1",
        explorer_url: "https://explorer.aptoslabs.com",
    };

    /// Get network configuration for specific network type
    pub fn for_network(network: NetworkType) -> &'static NetworkConfig {
        match network {
            NetworkType::Devnet => &Self::DEVNET,
            NetworkType::Testnet => &Self::TESTNET,
            NetworkType::Mainnet => &Self::MAINNET,
        }
    }

    /// Explorer page of a transaction, for manual lookup
    pub fn transaction_link(&self, hash: &str) -> String {
        format!("{}/txn/{}?network={}", self.explorer_url, hash, self.network_type.as_str())
    }

    /// Explorer page of an on-chain object (collections are objects)
    pub fn object_link(&self, address: &str) -> String {
        format!("{}/object/{}?network={}", self.explorer_url, address, self.network_type.as_str())
    }
}

impl NetworkType {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Devnet => "devnet",
            NetworkType::Testnet => "testnet",
            NetworkType::Mainnet => "mainnet",
        }
    }

    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            NetworkType::Devnet => "Devnet",
            NetworkType::Testnet => "Testnet",
            NetworkType::Mainnet => "Mainnet",
        }
    }

    pub fn config(&self) -> &'static NetworkConfig {
        NetworkConfig::for_network(*self)
    }
}

impl Default for NetworkType {
    fn default() -> Self {
        NetworkType::Testnet
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(NetworkType::Devnet),
            "testnet" => Ok(NetworkType::Testnet),
            "mainnet" => Ok(NetworkType::Mainnet),
            other => Err(format!("unknown network '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_network_names_case_insensitively() {
        assert_eq!("Testnet".parse::<NetworkType>(), Ok(NetworkType::Testnet));
        assert_eq!(" mainnet ".parse::<NetworkType>(), Ok(NetworkType::Mainnet));
        assert!("localnet-x".parse::<NetworkType>().is_err());
    }

    #[test]
    fn transaction_link_carries_network() {
        let link = NetworkType::Devnet.config().transaction_link("0xabc");
        assert_eq!(link, "https://explorer.aptoslabs.com/txn/0xabc?network=devnet");
    }
}
