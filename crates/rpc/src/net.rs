//! Network namespace (net_*) RPC handlers.
//!
//! Peer management belongs to the node, so the facade answers with what it
//! knows locally: the chain ID and the fact that it is serving.

use alloy_primitives::U64;
use async_trait::async_trait;
use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

/// net_* rpc interface
#[rpc(server, namespace = "net")]
pub trait NetRpc {
    /// Returns the network ID as a decimal string.
    #[method(name = "version")]
    async fn version(&self) -> RpcResult<String>;

    /// Returns true while the node is accepting connections.
    #[method(name = "listening")]
    async fn listening(&self) -> RpcResult<bool>;

    /// Returns the number of connected peers.
    #[method(name = "peerCount")]
    async fn peer_count(&self) -> RpcResult<U64>;
}

/// Handler for the `net` namespace.
pub struct NetApi {
    chain_id: u64,
}

impl NetApi {
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }
}

#[async_trait]
impl NetRpcServer for NetApi {
    async fn version(&self) -> RpcResult<String> {
        Ok(self.chain_id.to_string())
    }

    async fn listening(&self) -> RpcResult<bool> {
        Ok(true)
    }

    async fn peer_count(&self) -> RpcResult<U64> {
        Ok(U64::ZERO)
    }
}
