use alloy_primitives::{Bytes, B256, U64};
use alloy_rpc_types_eth::{Block, BlockNumberOrTag};
use async_trait::async_trait;
use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;
use tracing::{debug, trace, warn};

use crate::config::BlockNumberFallback;
use crate::context::RpcContext;
use crate::error::RpcError;
use crate::metrics;
use crate::traits::DagTopologyManager;

/// eth_* rpc interface.
#[rpc(server, namespace = "eth")]
pub trait EthRpc {
    /// Returns the height of the current virtual block.
    #[method(name = "blockNumber")]
    async fn block_number(&self) -> RpcResult<U64>;

    /// Returns the chain ID of the current network.
    #[method(name = "chainId")]
    async fn chain_id(&self) -> RpcResult<U64>;

    /// Returns the block at the given height. Not served yet: always `null`.
    #[method(name = "getBlockByNumber")]
    async fn block_by_number(
        &self,
        number: BlockNumberOrTag,
        full_transactions: bool,
    ) -> RpcResult<Option<Block>>;

    /// Submits a signed transaction. Not served yet: always the zero hash.
    #[method(name = "sendRawTransaction")]
    async fn send_raw_transaction(&self, bytes: Bytes) -> RpcResult<B256>;
}

/// Handler for the `eth` namespace.
pub struct EthApi<D: ?Sized> {
    ctx: RpcContext<D>,
}

impl<D: DagTopologyManager + ?Sized> EthApi<D> {
    /// Create a new handler over the shared context.
    pub fn new(ctx: RpcContext<D>) -> Self {
        Self { ctx }
    }

    /// Height of the current virtual block, surfacing lookup failures.
    pub async fn try_block_number(&self) -> Result<u64, RpcError> {
        let dag = self.ctx.dag();
        let hash = dag.virtual_block_hash().await;
        trace!(%hash, "Resolving virtual block header");

        dag.block_header_by_hash(hash)
            .await
            .map(|header| header.block_number())
            .map_err(|e| RpcError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl<D> EthRpcServer for EthApi<D>
where
    D: DagTopologyManager + ?Sized + 'static,
{
    async fn block_number(&self) -> RpcResult<U64> {
        match self.try_block_number().await {
            Ok(number) => Ok(U64::from(number)),
            Err(err) => {
                warn!(error = %err, "Virtual block header lookup failed");
                metrics::record_block_number_fallback();
                match self.ctx.block_number_fallback() {
                    BlockNumberFallback::Zero => Ok(U64::ZERO),
                    BlockNumberFallback::Error => Err(err.into()),
                }
            }
        }
    }

    async fn chain_id(&self) -> RpcResult<U64> {
        Ok(U64::from(self.ctx.chain_id()))
    }

    async fn block_by_number(
        &self,
        number: BlockNumberOrTag,
        full_transactions: bool,
    ) -> RpcResult<Option<Block>> {
        debug!(?number, full_transactions, "eth_getBlockByNumber is not served");
        Ok(None)
    }

    async fn send_raw_transaction(&self, bytes: Bytes) -> RpcResult<B256> {
        debug!(len = bytes.len(), "eth_sendRawTransaction is not served");
        Ok(B256::ZERO)
    }
}
