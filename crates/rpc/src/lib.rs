//! Phoenix JSON-RPC Server
//!
//! Ethereum-compatible JSON-RPC facade in front of the Phoenix block DAG.
//!
//! # Features
//!
//! - HTTP JSON-RPC server (default port: 8545)
//! - eth_*, web3_*, net_* namespaces
//! - Embeddable single-request entry point ([`RpcServer::serve_request`])
//! - Prometheus metrics, served by [`metrics::spawn_metrics_server`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use phoenix_rpc::{InMemoryDag, RpcConfig, RpcServer};
//!
//! let config = RpcConfig::default();
//! let server = RpcServer::new(config, Arc::new(InMemoryDag::default()))?;
//! let addr = server.start(server.config().http_addr).await?;
//! ```

pub mod adapters;
pub mod config;
pub mod context;
pub mod error;
pub mod eth;
pub mod metrics;
pub mod middleware;
pub mod net;
pub mod server;
mod service;
pub mod traits;
pub mod web3;

// Re-export main types
pub use adapters::InMemoryDag;
pub use config::{BlockNumberFallback, RpcConfig, RpcNamespace};
pub use context::RpcContext;
pub use error::{RpcError, RpcResult};
pub use middleware::{IpAllowlist, RequestMetrics, RequestTiming};
pub use server::{RpcServer, ServerState};
pub use traits::{BlockHeader, DagError, DagTopologyManager};

// Re-export RPC server traits for method registration
pub use eth::{EthApi, EthRpcServer};
pub use net::{NetApi, NetRpcServer};
pub use web3::{Web3Api, Web3RpcServer};
