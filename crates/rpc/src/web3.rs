//! Web3 namespace (web3_*) RPC handlers.

use alloy_primitives::{keccak256, Bytes, B256};
use async_trait::async_trait;
use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

/// Client version string reported by `web3_clientVersion`.
pub const CLIENT_VERSION: &str = concat!("phoenix/v", env!("CARGO_PKG_VERSION"));

/// Web3 rpc interface.
#[rpc(server, namespace = "web3")]
pub trait Web3Rpc {
    /// Returns current client version.
    #[method(name = "clientVersion")]
    async fn client_version(&self) -> RpcResult<String>;

    /// Returns sha3 of the given data.
    #[method(name = "sha3")]
    fn sha3(&self, input: Bytes) -> RpcResult<B256>;
}

/// Handler for the `web3` namespace.
#[derive(Debug, Default)]
pub struct Web3Api;

impl Web3Api {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Web3RpcServer for Web3Api {
    async fn client_version(&self) -> RpcResult<String> {
        Ok(CLIENT_VERSION.to_string())
    }

    fn sha3(&self, input: Bytes) -> RpcResult<B256> {
        Ok(keccak256(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_version() {
        let version = Web3Api::new().client_version().await.unwrap();
        assert!(version.starts_with("phoenix/v"));
    }

    #[test]
    fn test_sha3() {
        // keccak256("") is a well-known constant
        let hash = Web3Api::new().sha3(Bytes::new()).unwrap();
        assert_eq!(
            hash.to_string(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }
}
