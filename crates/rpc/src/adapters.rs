//! In-memory DAG adapter.
//!
//! `InMemoryDag` implements [`DagTopologyManager`] over a header map guarded by
//! a `parking_lot::RwLock`. It backs the daemon's devnet mode and the tests;
//! the full node plugs its own DAG store in through the same trait.

use std::collections::HashMap;

use alloy_primitives::{keccak256, B256};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::traits::{BlockHeader, DagError, DagTopologyManager};

#[derive(Debug)]
struct DagState {
    headers: HashMap<B256, BlockHeader>,
    virtual_hash: B256,
}

/// Thread-safe in-memory block DAG.
#[derive(Debug)]
pub struct InMemoryDag {
    state: RwLock<DagState>,
}

impl InMemoryDag {
    /// Create a DAG containing only the given genesis header, which is also
    /// the initial virtual block.
    pub fn new(genesis: BlockHeader) -> Self {
        let virtual_hash = genesis.hash;
        let mut headers = HashMap::new();
        headers.insert(genesis.hash, genesis);

        Self {
            state: RwLock::new(DagState {
                headers,
                virtual_hash,
            }),
        }
    }

    /// Create a DAG with a deterministic genesis at height zero.
    pub fn with_genesis(timestamp: u64) -> Self {
        Self::new(BlockHeader::new(genesis_hash(), Vec::new(), 0, timestamp))
    }

    /// Insert a header. All of its parents must already be known.
    pub fn add_block(&self, header: BlockHeader) -> Result<(), DagError> {
        let mut state = self.state.write();
        if let Some(missing) = header
            .parent_hashes
            .iter()
            .find(|parent| !state.headers.contains_key(*parent))
        {
            return Err(DagError::HeaderNotFound(*missing));
        }

        debug!(hash = %header.hash, number = header.number, "Adding block to DAG");
        state.headers.insert(header.hash, header);
        Ok(())
    }

    /// Move the virtual block to `hash`.
    ///
    /// The hash is not checked against known headers, so the virtual block can
    /// point at a header that has not arrived yet.
    pub fn set_virtual(&self, hash: B256) {
        trace!(%hash, "Setting virtual block");
        self.state.write().virtual_hash = hash;
    }

    /// Append a block on top of the current virtual block and make it virtual.
    ///
    /// Fails if the virtual header is not stored, since the new block would
    /// reference an unknown parent.
    pub fn extend_virtual(&self, timestamp: u64) -> Result<BlockHeader, DagError> {
        let mut state = self.state.write();
        let parent = state.virtual_hash;
        let number = state
            .headers
            .get(&parent)
            .ok_or(DagError::HeaderNotFound(parent))?
            .number
            .checked_add(1)
            .ok_or(DagError::HeightOverflow(parent))?;

        let mut preimage = Vec::with_capacity(40);
        preimage.extend_from_slice(parent.as_slice());
        preimage.extend_from_slice(&number.to_be_bytes());
        let header = BlockHeader::new(keccak256(&preimage), vec![parent], number, timestamp);

        state.headers.insert(header.hash, header.clone());
        state.virtual_hash = header.hash;
        Ok(header)
    }

    /// Number of stored headers.
    pub fn len(&self) -> usize {
        self.state.read().headers.len()
    }

    /// Whether the DAG holds no headers.
    pub fn is_empty(&self) -> bool {
        self.state.read().headers.is_empty()
    }
}

impl Default for InMemoryDag {
    fn default() -> Self {
        Self::with_genesis(0)
    }
}

#[async_trait]
impl DagTopologyManager for InMemoryDag {
    async fn virtual_block_hash(&self) -> B256 {
        self.state.read().virtual_hash
    }

    async fn block_header_by_hash(&self, hash: B256) -> Result<BlockHeader, DagError> {
        trace!("InMemoryDag::block_header_by_hash({})", hash);
        self.state
            .read()
            .headers
            .get(&hash)
            .cloned()
            .ok_or(DagError::HeaderNotFound(hash))
    }
}

/// Hash of the devnet genesis block.
pub fn genesis_hash() -> B256 {
    keccak256(b"phoenix-genesis")
}
