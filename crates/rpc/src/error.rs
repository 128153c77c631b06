//! RPC error types and result aliases.

use jsonrpsee::types::ErrorObjectOwned;
use thiserror::Error;

/// Error code used for server-side unavailability, per EIP-1474.
pub const UNAVAILABLE_CODE: i32 = -32000;

/// RPC-specific errors.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Invalid parameters provided.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Method not supported.
    #[error("Method not supported: {0}")]
    MethodNotSupported(String),

    /// The DAG could not answer the query (missing header, storage failure).
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Invalid or unreadable configuration.
    #[error("Config error: {0}")]
    Config(String),
}

/// RPC result type alias.
pub type RpcResult<T> = Result<T, RpcError>;

impl From<RpcError> for ErrorObjectOwned {
    fn from(err: RpcError) -> Self {
        let (code, message) = match &err {
            RpcError::Internal(msg) => (-32603, format!("Internal error: {}", msg)),
            RpcError::InvalidParams(msg) => (-32602, format!("Invalid params: {}", msg)),
            RpcError::NotFound(msg) => (-32602, format!("Not found: {}", msg)),
            RpcError::MethodNotSupported(msg) => (-32601, format!("Method not found: {}", msg)),
            RpcError::Unavailable(msg) => (UNAVAILABLE_CODE, format!("Unavailable: {}", msg)),
            RpcError::Config(msg) => (-32603, format!("Config error: {}", msg)),
        };

        ErrorObjectOwned::owned(code, message, None::<()>)
    }
}
