use serde::{Deserialize, Serialize};
use std::fmt;

use super::network_config::NetworkType;
use super::wallet::AccountAddress;

const CREATOR_ADDRESS_VAR: &str = "VITE_COLLECTION_CREATOR_ADDRESS";
const MODULE_ADDRESS_VAR: &str = "VITE_MODULE_ADDRESS";
const NETWORK_VAR: &str = "VITE_APP_NETWORK";
const IS_PROD_VAR: &str = "VITE_IS_PROD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "Missing configuration value {}", key),
            ConfigError::Invalid { key, reason } => write!(f, "Invalid configuration value {}: {}", key, reason),
            ConfigError::Parse(msg) => write!(f, "Failed to parse configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Deployment settings injected into the guard and orchestrator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchpadConfig {
    /// Only this account may create collections
    pub creator_address: AccountAddress,
    /// Account that published the launchpad module
    pub module_address: AccountAddress,
    #[serde(default)]
    pub network: NetworkType,
    /// Production deployments only serve the public mint page
    #[serde(default)]
    pub is_production: bool,
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Ok(false),
        "1" | "true" | "yes" => Ok(true),
        other => Err(ConfigError::Invalid { key, reason: format!("expected a boolean, got '{}'", other) }),
    }
}

fn parse_address(key: &'static str, value: Option<String>) -> Result<AccountAddress, ConfigError> {
    let value = value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))?;
    value.parse().map_err(|reason| ConfigError::Invalid { key, reason })
}

impl LaunchpadConfig {
    pub fn new(creator_address: AccountAddress, module_address: AccountAddress, network: NetworkType) -> Self {
        Self {
            creator_address,
            module_address,
            network,
            is_production: false,
        }
    }

    pub fn production(mut self, is_production: bool) -> Self {
        self.is_production = is_production;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Build from `VITE_*` build variables
    ///
    /// The network defaults to testnet and the production flag to false.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut creator = None;
        let mut module = None;
        let mut network = None;
        let mut is_prod = None;

        for (key, value) in vars {
            match key.as_ref() {
                CREATOR_ADDRESS_VAR => creator = Some(value.into()),
                MODULE_ADDRESS_VAR => module = Some(value.into()),
                NETWORK_VAR => network = Some(value.into()),
                IS_PROD_VAR => is_prod = Some(value.into()),
                _ => {}
            }
        }

        let network = match network.filter(|n| !n.trim().is_empty()) {
            Some(name) => name.parse::<NetworkType>()
                .map_err(|reason| ConfigError::Invalid { key: NETWORK_VAR, reason })?,
            None => NetworkType::default(),
        };
        let is_production = match is_prod {
            Some(flag) => parse_flag(IS_PROD_VAR, &flag)?,
            None => false,
        };

        let config = Self {
            creator_address: parse_address(CREATOR_ADDRESS_VAR, creator)?,
            module_address: parse_address(MODULE_ADDRESS_VAR, module)?,
            network,
            is_production,
        };
        log::info!("Launchpad configured for {} ({})",
                   config.network.display_name(),
                   if config.is_production { "PRODUCTION" } else { "DEVELOPMENT" });
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_build_variables() {
        let config = LaunchpadConfig::from_vars([
            ("VITE_COLLECTION_CREATOR_ADDRESS", "0xabc"),
            ("VITE_MODULE_ADDRESS", "0xcafe"),
            ("VITE_APP_NETWORK", "mainnet"),
            ("VITE_IS_PROD", "true"),
            ("PATH", "/usr/bin"),
        ]).unwrap();

        assert_eq!(config.creator_address, "0xabc".parse().unwrap());
        assert_eq!(config.module_address, "0xcafe".parse().unwrap());
        assert_eq!(config.network, NetworkType::Mainnet);
        assert!(config.is_production);
    }

    #[test]
    fn network_and_production_have_defaults() {
        let config = LaunchpadConfig::from_vars([
            ("VITE_COLLECTION_CREATOR_ADDRESS", "0xabc"),
            ("VITE_MODULE_ADDRESS", "0xcafe"),
        ]).unwrap();
        assert_eq!(config.network, NetworkType::Testnet);
        assert!(!config.is_production);
    }

    #[test]
    fn reports_missing_and_invalid_values() {
        assert_eq!(
            LaunchpadConfig::from_vars([("VITE_MODULE_ADDRESS", "0xcafe")]),
            Err(ConfigError::Missing("VITE_COLLECTION_CREATOR_ADDRESS"))
        );
        assert!(matches!(
            LaunchpadConfig::from_vars([
                ("VITE_COLLECTION_CREATOR_ADDRESS", "not-hex"),
                ("VITE_MODULE_ADDRESS", "0xcafe"),
            ]),
            Err(ConfigError::Invalid { key: "VITE_COLLECTION_CREATOR_ADDRESS", .. })
        ));
        assert!(matches!(
            LaunchpadConfig::from_vars([
                ("VITE_COLLECTION_CREATOR_ADDRESS", "0xabc"),
                ("VITE_MODULE_ADDRESS", "0xcafe"),
                ("VITE_IS_PROD", "maybe"),
            ]),
            Err(ConfigError::Invalid { key: "VITE_IS_PROD", .. })
        ));
    }

    #[test]
    fn parses_json_config() {
        let config = LaunchpadConfig::from_json(
            r#"{"creatorAddress":"0xabc","moduleAddress":"0xcafe","network":"devnet"}"#,
        ).unwrap();
        assert_eq!(config.network, NetworkType::Devnet);
        assert!(!config.is_production);

        assert!(matches!(
            LaunchpadConfig::from_json(r#"{"creatorAddress":"0xzz","moduleAddress":"0x1"}"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
