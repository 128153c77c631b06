//! Ethereum namespace (eth_*) RPC handlers.

mod api;

pub use api::{EthApi, EthRpcServer};
