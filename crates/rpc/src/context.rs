//! Shared request context handed to every namespace handler.

use std::sync::Arc;

use crate::config::{BlockNumberFallback, RpcConfig};
use crate::traits::DagTopologyManager;

/// Read-only state shared by all namespace handlers of one server.
///
/// Holds the injected DAG manager by shared reference; the server never
/// drives the manager's lifecycle.
pub struct RpcContext<D: ?Sized> {
    dag: Arc<D>,
    chain_id: u64,
    block_number_fallback: BlockNumberFallback,
}

impl<D: ?Sized> Clone for RpcContext<D> {
    fn clone(&self) -> Self {
        Self {
            dag: Arc::clone(&self.dag),
            chain_id: self.chain_id,
            block_number_fallback: self.block_number_fallback,
        }
    }
}

impl<D: DagTopologyManager + ?Sized> RpcContext<D> {
    /// Create a context around the given DAG manager.
    pub fn new(dag: Arc<D>, chain_id: u64, block_number_fallback: BlockNumberFallback) -> Self {
        Self {
            dag,
            chain_id,
            block_number_fallback,
        }
    }

    /// Create a context taking chain ID and fallback policy from the config.
    pub fn from_config(dag: Arc<D>, config: &RpcConfig) -> Self {
        Self::new(dag, config.chain_id, config.block_number_fallback)
    }

    /// The DAG topology manager.
    pub fn dag(&self) -> &D {
        &self.dag
    }

    /// Chain ID reported to clients.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Policy for failed block number lookups.
    pub fn block_number_fallback(&self) -> BlockNumberFallback {
        self.block_number_fallback
    }
}
