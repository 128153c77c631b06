//! RPC server implementation managing the HTTP transport.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::server::{
    serve_with_graceful_shutdown, stop_channel, RpcServiceBuilder, ServerBuilder, ServerHandle,
};
use jsonrpsee::{Methods, RpcModule};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tracing::{debug, info, warn};

use crate::config::{RpcConfig, RpcNamespace};
use crate::context::RpcContext;
use crate::error::{RpcError, RpcResult};
use crate::eth::{EthApi, EthRpcServer};
use crate::middleware::{IpAllowlist, RequestMetrics};
use crate::net::{NetApi, NetRpcServer};
use crate::service;
use crate::traits::DagTopologyManager;
use crate::web3::{Web3Api, Web3RpcServer};

/// RPC server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Server is stopped.
    Stopped,
    /// Server is starting.
    Starting,
    /// Server is running.
    Running,
    /// Server is stopping.
    Stopping,
}

/// Handle of a running HTTP transport.
struct RunningTransport {
    handle: ServerHandle,
    local_addr: SocketAddr,
}

/// JSON-RPC server in front of a DAG topology manager.
///
/// The method table is built once at construction and shared by the HTTP
/// transport started with [`RpcServer::start`] and by
/// [`RpcServer::serve_request`].
pub struct RpcServer<D: ?Sized> {
    /// Server configuration.
    config: Arc<RpcConfig>,
    /// Context shared with every namespace handler.
    ctx: RpcContext<D>,
    /// Registered methods.
    module: RpcModule<()>,
    /// Caller filter, applied to transport connections and embedded requests.
    allowlist: IpAllowlist,
    /// Serializes `start` and `stop`.
    lifecycle: Mutex<()>,
    /// Current server state.
    state: RwLock<ServerState>,
    /// HTTP transport, while running.
    transport: RwLock<Option<RunningTransport>>,
}

impl<D> RpcServer<D>
where
    D: DagTopologyManager + ?Sized + 'static,
{
    /// Create a new RPC server over the given DAG manager.
    pub fn new(config: RpcConfig, dag: Arc<D>) -> RpcResult<Self> {
        config.validate().map_err(RpcError::Config)?;

        let ctx = RpcContext::from_config(dag, &config);
        let module = build_rpc_module(&ctx, &config)?;
        let allowlist = IpAllowlist::new(config.ip_allowlist.clone());

        Ok(Self {
            config: Arc::new(config),
            ctx,
            module,
            allowlist,
            lifecycle: Mutex::new(()),
            state: RwLock::new(ServerState::Stopped),
            transport: RwLock::new(None),
        })
    }

    /// Get the server configuration.
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Get the shared request context.
    pub fn context(&self) -> &RpcContext<D> {
        &self.ctx
    }

    /// Names of all registered methods.
    pub fn method_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.module.method_names().collect();
        names.sort_unstable();
        names
    }

    /// Get the current server state.
    pub async fn state(&self) -> ServerState {
        *self.state.read().await
    }

    /// Address the HTTP transport is bound to, while running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.transport.read().await.as_ref().map(|t| t.local_addr)
    }

    /// Start serving JSON-RPC over HTTP on `addr`.
    ///
    /// Returns the bound address, which differs from `addr` when port 0 is
    /// requested.
    pub async fn start(&self, addr: SocketAddr) -> RpcResult<SocketAddr> {
        let _lifecycle = self.lifecycle.lock().await;
        {
            let mut state = self.state.write().await;
            if *state != ServerState::Stopped {
                return Err(RpcError::Internal(
                    "Server is not in stopped state".to_string(),
                ));
            }
            *state = ServerState::Starting;
        }

        match self.start_http_server(addr).await {
            Ok(transport) => {
                let local_addr = transport.local_addr;
                info!("HTTP RPC server started on {}", local_addr);
                *self.transport.write().await = Some(transport);
                *self.state.write().await = ServerState::Running;
                Ok(local_addr)
            }
            Err(e) => {
                warn!("Failed to start HTTP server: {}", e);
                *self.state.write().await = ServerState::Stopped;
                Err(RpcError::Internal(format!(
                    "Failed to start HTTP server: {}",
                    e
                )))
            }
        }
    }

    /// Start the HTTP server.
    ///
    /// Connections are accepted here rather than inside jsonrpsee so that the
    /// caller address can be checked against the allowlist before any request
    /// is read.
    async fn start_http_server(&self, addr: SocketAddr) -> Result<RunningTransport, String> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            format!(
                "Failed to bind HTTP RPC server to {}. \
                 Port {} may already be in use. \
                 Check with: lsof -i :{} (error: {})",
                addr,
                addr.port(),
                addr.port(),
                e
            )
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let method_names: Arc<HashSet<&'static str>> =
            Arc::new(self.module.method_names().collect());
        let rpc_middleware = RpcServiceBuilder::new()
            .layer_fn(move |service| RequestMetrics::new(service, Arc::clone(&method_names)));
        let service_builder = ServerBuilder::default()
            .max_request_body_size(self.config.max_request_body_size)
            .set_rpc_middleware(rpc_middleware)
            .http_only()
            .to_service_builder();

        if self.allowlist.is_active() {
            info!("RPC IP allowlist enabled");
        }

        let methods: Methods = self.module.clone().into();
        let allowlist = self.allowlist.clone();
        let connections = Arc::new(Semaphore::new(self.config.max_connections as usize));
        let (stop_handle, handle) = stop_channel();

        tokio::spawn(async move {
            loop {
                let (stream, remote) = tokio::select! {
                    _ = stop_handle.clone().shutdown() => break,
                    accepted = listener.accept() => match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!("Failed to accept RPC connection: {}", e);
                            continue;
                        }
                    },
                };

                // Dropping the stream closes the connection without a response
                if allowlist.check(remote.ip()).is_err() {
                    continue;
                }
                let Ok(permit) = Arc::clone(&connections).try_acquire_owned() else {
                    warn!(%remote, "RPC connection limit reached, rejecting connection");
                    continue;
                };

                let service = service_builder
                    .clone()
                    .build(methods.clone(), stop_handle.clone());
                let stopped = stop_handle.clone().shutdown();
                tokio::spawn(async move {
                    if let Err(e) = serve_with_graceful_shutdown(stream, service, stopped).await {
                        debug!(%remote, error = %e, "RPC connection closed with error");
                    }
                    drop(permit);
                });
            }
            debug!("RPC accept loop stopped");
        });

        Ok(RunningTransport { handle, local_addr })
    }

    /// Stop the RPC server. Stopping a server that is not running is a no-op.
    ///
    /// A call made while [`RpcServer::start`] is in progress waits for it and
    /// then stops the freshly started transport.
    pub async fn stop(&self) -> RpcResult<()> {
        let _lifecycle = self.lifecycle.lock().await;
        {
            let mut state = self.state.write().await;
            if *state != ServerState::Running {
                return Ok(());
            }
            *state = ServerState::Stopping;
        }

        if let Some(transport) = self.transport.write().await.take() {
            let result = transport.handle.stop();
            if let Err(e) = result {
                *self.state.write().await = ServerState::Stopped;
                return Err(RpcError::Internal(format!(
                    "Failed to stop HTTP server: {:?}",
                    e
                )));
            }
            transport.handle.stopped().await;
            info!("HTTP RPC server stopped");
        }

        *self.state.write().await = ServerState::Stopped;
        Ok(())
    }

    /// Handle one JSON-RPC request delivered by an external HTTP server.
    ///
    /// Works whether or not the HTTP transport is running.
    pub async fn serve_request(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> http::Response<String> {
        service::handle_request(
            &self.module,
            &self.allowlist,
            self.config.max_request_body_size,
            request,
        )
        .await
    }
}

/// Build the RPC module with all enabled namespaces.
fn build_rpc_module<D>(ctx: &RpcContext<D>, config: &RpcConfig) -> RpcResult<RpcModule<()>>
where
    D: DagTopologyManager + ?Sized + 'static,
{
    let mut module = RpcModule::new(());

    let eth_api = EthApi::new(ctx.clone());
    module
        .merge(eth_api.into_rpc())
        .map_err(|e| RpcError::Internal(format!("Failed to merge eth module: {}", e)))?;
    info!("Registered eth_* namespace");

    if config.is_namespace_enabled(RpcNamespace::Net) {
        let net_api = NetApi::new(ctx.chain_id());
        module
            .merge(net_api.into_rpc())
            .map_err(|e| RpcError::Internal(format!("Failed to merge net module: {}", e)))?;
        info!("Registered net_* namespace");
    }

    if config.is_namespace_enabled(RpcNamespace::Web3) {
        module
            .merge(Web3Api::new().into_rpc())
            .map_err(|e| RpcError::Internal(format!("Failed to merge web3 module: {}", e)))?;
        info!("Registered web3_* namespace");
    }

    Ok(module)
}
