//! RPC server configuration.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use crate::error::{RpcError, RpcResult};

/// Phoenix mainnet chain ID.
pub const PHOENIX_MAINNET_CHAIN_ID: u64 = 888;

/// Phoenix testnet chain ID.
pub const PHOENIX_TESTNET_CHAIN_ID: u64 = 8888;

/// RPC namespace enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RpcNamespace {
    /// Ethereum namespace (eth_*)
    #[default]
    Eth,
    /// Web3 namespace (web3_*)
    Web3,
    /// Network namespace (net_*)
    Net,
}

/// What `eth_blockNumber` answers when the virtual block header cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlockNumberFallback {
    /// Report height zero.
    #[default]
    Zero,
    /// Return an "unavailable" JSON-RPC error.
    Error,
}

/// RPC server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// HTTP listen address (default: 0.0.0.0:8545).
    pub http_addr: SocketAddr,

    /// Maximum concurrent connections (default: 100).
    pub max_connections: u32,

    /// Maximum request body size in bytes (default: 10 MiB).
    pub max_request_body_size: u32,

    /// Chain ID for eth_chainId and net_version responses.
    pub chain_id: u64,

    /// Enabled RPC namespaces. `eth` is mandatory.
    pub enabled_namespaces: Vec<RpcNamespace>,

    /// Optional IP allowlist for embedded HTTP requests. If None, all IPs are allowed.
    pub ip_allowlist: Option<Vec<IpAddr>>,

    /// Behavior of eth_blockNumber on header lookup failure.
    pub block_number_fallback: BlockNumberFallback,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8545),
            max_connections: 100,
            max_request_body_size: 10 * 1024 * 1024,
            chain_id: PHOENIX_MAINNET_CHAIN_ID,
            enabled_namespaces: vec![RpcNamespace::Eth, RpcNamespace::Net, RpcNamespace::Web3],
            ip_allowlist: None,
            block_number_fallback: BlockNumberFallback::Zero,
        }
    }
}

impl RpcConfig {
    /// Create a new RpcConfig with the given chain ID.
    pub fn with_chain_id(chain_id: u64) -> Self {
        Self {
            chain_id,
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load(path: &Path) -> RpcResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            RpcError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml(&content)
            .map_err(|e| RpcError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> RpcResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RpcError::Config(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| RpcError::Config(format!("failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| RpcError::Config(format!("failed to write {}: {}", path.display(), e)))
    }

    /// Check if a namespace is enabled.
    pub fn is_namespace_enabled(&self, ns: RpcNamespace) -> bool {
        self.enabled_namespaces.contains(&ns)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_connections == 0 {
            return Err("max_connections must be > 0".to_string());
        }
        if self.max_request_body_size == 0 {
            return Err("max_request_body_size must be > 0".to_string());
        }
        if !self.is_namespace_enabled(RpcNamespace::Eth) {
            return Err("The eth namespace must be enabled".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RpcConfig::default();
        assert_eq!(config.http_addr.port(), 8545);
        assert_eq!(config.chain_id, PHOENIX_MAINNET_CHAIN_ID);
        assert_eq!(config.block_number_fallback, BlockNumberFallback::Zero);
        assert!(config.ip_allowlist.is_none());
        assert!(config.is_namespace_enabled(RpcNamespace::Web3));
    }

    #[test]
    fn test_config_validation() {
        let mut config = RpcConfig::default();
        assert!(config.validate().is_ok());

        config.max_connections = 0;
        assert!(config.validate().is_err());

        config.max_connections = 100;
        config.enabled_namespaces = vec![RpcNamespace::Net];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config = RpcConfig::from_toml(
            r#"
            chain_id = 8888
            enabled_namespaces = ["eth"]
            block_number_fallback = "error"
            "#,
        )
        .unwrap();

        assert_eq!(config.chain_id, PHOENIX_TESTNET_CHAIN_ID);
        assert_eq!(config.enabled_namespaces, vec![RpcNamespace::Eth]);
        assert_eq!(config.block_number_fallback, BlockNumberFallback::Error);
        // Unset fields keep their defaults
        assert_eq!(config.max_connections, 100);
    }

    #[test]
    fn test_unknown_namespace_rejected() {
        assert!(RpcConfig::from_toml(r#"enabled_namespaces = ["bdp"]"#).is_err());
    }
}
