//! Process-wide runner configuration
//!
//! Secrets and endpoint credentials are read from the environment once, into
//! a [`RunnerConfig`] that is handed to network resolution explicitly. Nothing
//! else in the library reads the environment.

use std::time::Duration;

/// Environment variable holding the Infura API key
pub const ENV_API_KEY: &str = "INFURA_API_KEY";

/// Environment variable holding the test/production signing key
pub const ENV_PRIVATE_KEY: &str = "PRIVATE_KEY";

/// Environment variable overriding the local development signing key
pub const ENV_LOCAL_PRIVATE_KEY: &str = "LOCAL_PRIVATE_KEY";

/// First Hardhat/Anvil development account; only ever used for `localhost`
pub const DEFAULT_LOCAL_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Default interval between receipt polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default time to wait for a transaction to be mined
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Runner configuration
#[derive(Clone)]
pub struct RunnerConfig {
    /// Credential for remote RPC endpoints (empty when unset)
    pub api_key: String,
    /// Signing key for test and production networks
    pub private_key: Option<String>,
    /// Signing key override for the local development network
    pub local_private_key: Option<String>,
    /// How often to poll for transaction receipts
    pub confirmation_poll_interval: Duration,
    /// How long to wait for a transaction to be mined
    pub confirmation_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            private_key: None,
            local_private_key: None,
            confirmation_poll_interval: DEFAULT_POLL_INTERVAL,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }
}

impl RunnerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            api_key: non_empty(ENV_API_KEY).unwrap_or_default(),
            private_key: non_empty(ENV_PRIVATE_KEY),
            local_private_key: non_empty(ENV_LOCAL_PRIVATE_KEY),
            ..Self::default()
        }
    }

    /// Signing key for the local development network
    pub fn local_key(&self) -> &str {
        self.local_private_key
            .as_deref()
            .unwrap_or(DEFAULT_LOCAL_PRIVATE_KEY)
    }

    /// Signing key for remote networks, falling back to the local key
    pub fn remote_key(&self) -> &str {
        self.private_key.as_deref().unwrap_or_else(|| self.local_key())
    }
}

impl std::fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<set>" })
            .field("private_key", &self.private_key.as_ref().map(|_| "<set>"))
            .field(
                "local_private_key",
                &self.local_private_key.as_ref().map(|_| "<set>"),
            )
            .field("confirmation_poll_interval", &self.confirmation_poll_interval)
            .field("confirmation_timeout", &self.confirmation_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = RunnerConfig::from_lookup(lookup(&[]));
        assert_eq!(config.api_key, "");
        assert_eq!(config.local_key(), DEFAULT_LOCAL_PRIVATE_KEY);
        assert_eq!(config.remote_key(), DEFAULT_LOCAL_PRIVATE_KEY);
    }

    #[test]
    fn test_values_from_lookup() {
        let config = RunnerConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "abc123"),
            (ENV_PRIVATE_KEY, "0x01"),
            (ENV_LOCAL_PRIVATE_KEY, "0x02"),
        ]));
        assert_eq!(config.api_key, "abc123");
        assert_eq!(config.remote_key(), "0x01");
        assert_eq!(config.local_key(), "0x02");
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let config = RunnerConfig::from_lookup(lookup(&[(ENV_PRIVATE_KEY, "  ")]));
        assert_eq!(config.private_key, None);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = RunnerConfig {
            private_key: Some("0xdeadbeef".to_string()),
            ..RunnerConfig::default()
        };
        assert!(!format!("{:?}", config).contains("deadbeef"));
    }
}
