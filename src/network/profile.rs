//! Network selection
//!
//! Maps a network selector (`localhost`, `sepolia`, `mainnet`) plus the
//! runner configuration to an immutable [`NetworkProfile`]. Unrecognized
//! selectors resolve to `localhost`.

use crate::config::RunnerConfig;
use std::fmt;

/// Gas price attached to production transactions (0.58 gwei)
pub const MAINNET_GAS_PRICE: u128 = 580_000_000;

/// Local development RPC endpoint
pub const LOCALHOST_RPC_URL: &str = "http://localhost:8545";

/// Known networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Localhost,
    Sepolia,
    Mainnet,
}

impl Network {
    /// Resolve a selector; anything unrecognized is `Localhost`
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim().to_ascii_lowercase().as_str() {
            "sepolia" => Network::Sepolia,
            "mainnet" => Network::Mainnet,
            _ => Network::Localhost,
        }
    }

    /// Selector name
    pub fn name(&self) -> &'static str {
        match self {
            Network::Localhost => "localhost",
            Network::Sepolia => "sepolia",
            Network::Mainnet => "mainnet",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Network::Localhost => "Hardhat Local",
            Network::Sepolia => "Sepolia Testnet",
            Network::Mainnet => "Ethereum Mainnet",
        }
    }

    /// Whether transactions here spend real funds
    pub fn is_production(&self) -> bool {
        matches!(self, Network::Mainnet)
    }

    /// Whether the node's reported chain id is acceptable for this network
    pub fn accepts_chain_id(&self, chain_id: u64) -> bool {
        match self {
            Network::Localhost => true,
            Network::Sepolia => chain_id == 11_155_111,
            Network::Mainnet => chain_id == 1,
        }
    }

    /// Block explorer page for an address, if the network has one
    pub fn explorer_url(&self, address: &str) -> Option<String> {
        match self {
            Network::Mainnet => Some(format!("https://etherscan.io/address/{}", address)),
            Network::Sepolia => Some(format!("https://sepolia.etherscan.io/address/{}", address)),
            Network::Localhost => None,
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Network::Localhost
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything needed to talk to one network
#[derive(Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    pub network: Network,
    pub label: String,
    pub endpoint_url: String,
    pub signing_key: String,
    /// Gas price in wei attached to production transactions
    pub gas_price_override: Option<u128>,
}

impl NetworkProfile {
    /// Resolve a profile from a selector and the runner configuration
    pub fn resolve(selector: &str, config: &RunnerConfig) -> Self {
        Self::for_network(Network::from_selector(selector), config)
    }

    pub fn for_network(network: Network, config: &RunnerConfig) -> Self {
        let (endpoint_url, signing_key, gas_price_override) = match network {
            Network::Localhost => (LOCALHOST_RPC_URL.to_string(), config.local_key(), None),
            Network::Sepolia => (
                format!("https://sepolia.infura.io/v3/{}", config.api_key),
                config.remote_key(),
                None,
            ),
            Network::Mainnet => (
                format!("https://mainnet.infura.io/v3/{}", config.api_key),
                config.remote_key(),
                Some(MAINNET_GAS_PRICE),
            ),
        };

        Self {
            network,
            label: network.label().to_string(),
            endpoint_url,
            signing_key: signing_key.to_string(),
            gas_price_override,
        }
    }

    pub fn is_production(&self) -> bool {
        self.network.is_production()
    }
}

impl fmt::Debug for NetworkProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Infura URLs embed the API key
        let endpoint = match self.endpoint_url.rfind('/') {
            Some(idx) if self.network != Network::Localhost => {
                format!("{}/<redacted>", &self.endpoint_url[..idx])
            }
            _ => self.endpoint_url.clone(),
        };
        f.debug_struct("NetworkProfile")
            .field("network", &self.network)
            .field("label", &self.label)
            .field("endpoint_url", &endpoint)
            .field("gas_price_override", &self.gas_price_override)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LOCAL_PRIVATE_KEY;

    fn config() -> RunnerConfig {
        RunnerConfig {
            api_key: "KEY".to_string(),
            private_key: Some("0x01".to_string()),
            ..RunnerConfig::default()
        }
    }

    #[test]
    fn test_selectors() {
        assert_eq!(Network::from_selector("localhost"), Network::Localhost);
        assert_eq!(Network::from_selector("sepolia"), Network::Sepolia);
        assert_eq!(Network::from_selector("MAINNET"), Network::Mainnet);
        assert_eq!(Network::from_selector("goerli"), Network::Localhost);
        assert_eq!(Network::from_selector(""), Network::Localhost);
    }

    #[test]
    fn test_localhost_profile() {
        let profile = NetworkProfile::resolve("localhost", &config());
        assert_eq!(profile.label, "Hardhat Local");
        assert_eq!(profile.endpoint_url, "http://localhost:8545");
        assert_eq!(profile.signing_key, DEFAULT_LOCAL_PRIVATE_KEY);
        assert_eq!(profile.gas_price_override, None);
    }

    #[test]
    fn test_remote_profiles() {
        let sepolia = NetworkProfile::resolve("sepolia", &config());
        assert_eq!(sepolia.endpoint_url, "https://sepolia.infura.io/v3/KEY");
        assert_eq!(sepolia.signing_key, "0x01");
        assert_eq!(sepolia.gas_price_override, None);

        let mainnet = NetworkProfile::resolve("mainnet", &config());
        assert_eq!(mainnet.endpoint_url, "https://mainnet.infura.io/v3/KEY");
        assert_eq!(mainnet.gas_price_override, Some(MAINNET_GAS_PRICE));
        assert!(mainnet.is_production());
    }

    #[test]
    fn test_unknown_selector_matches_localhost() {
        assert_eq!(
            NetworkProfile::resolve("polygon", &config()),
            NetworkProfile::resolve("localhost", &config())
        );
    }

    #[test]
    fn test_profile_is_a_snapshot_of_config() {
        let mut config = config();
        let profile = NetworkProfile::resolve("sepolia", &config);
        config.api_key = "OTHER".to_string();
        assert_eq!(profile.endpoint_url, "https://sepolia.infura.io/v3/KEY");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let profile = NetworkProfile::resolve("mainnet", &config());
        let debug = format!("{:?}", profile);
        assert!(!debug.contains("KEY"));
        assert!(!debug.contains("0x01"));
    }

    #[test]
    fn test_chain_ids_and_explorers() {
        assert!(Network::Mainnet.accepts_chain_id(1));
        assert!(!Network::Mainnet.accepts_chain_id(11_155_111));
        assert!(Network::Localhost.accepts_chain_id(31337));
        assert_eq!(
            Network::Sepolia.explorer_url("0xabc").unwrap(),
            "https://sepolia.etherscan.io/address/0xabc"
        );
        assert!(Network::Localhost.explorer_url("0xabc").is_none());
    }
}
