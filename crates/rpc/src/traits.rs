//! Trait definitions for the DAG collaborator consumed by the RPC layer.
//!
//! The RPC layer never owns consensus state. It reads through a
//! [`DagTopologyManager`] injected at server construction, which enables:
//! - Dependency injection for testing
//! - Swappable backends (in-memory devnet, the full node's DAG store)

use alloy_primitives::B256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header of a block in the DAG.
///
/// A DAG block may reference several parents; `number` is the block's height
/// as exposed to Ethereum tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    /// Block hash.
    pub hash: B256,
    /// Hashes of the blocks this block merges.
    pub parent_hashes: Vec<B256>,
    /// Block height.
    pub number: u64,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
}

impl BlockHeader {
    /// Create a header with the given hash, parents and height.
    pub fn new(hash: B256, parent_hashes: Vec<B256>, number: u64, timestamp: u64) -> Self {
        Self {
            hash,
            parent_hashes,
            number,
            timestamp,
        }
    }

    /// Block height.
    pub fn block_number(&self) -> u64 {
        self.number
    }

    /// Whether this header has no parents.
    pub fn is_genesis(&self) -> bool {
        self.parent_hashes.is_empty()
    }
}

/// Errors reported by a DAG header lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DagError {
    /// No header is stored for the hash.
    #[error("block header not found: {0}")]
    HeaderNotFound(B256),

    /// The underlying store failed.
    #[error("dag storage error: {0}")]
    Storage(String),

    /// A child of this header would exceed the maximum block height.
    #[error("block height overflow above {0}")]
    HeightOverflow(B256),
}

/// Read access to the block DAG.
#[async_trait]
pub trait DagTopologyManager: Send + Sync {
    /// Hash of the current virtual block, the frontier of the DAG.
    async fn virtual_block_hash(&self) -> B256;

    /// Look up a block header by its hash.
    async fn block_header_by_hash(&self, hash: B256) -> Result<BlockHeader, DagError>;
}
