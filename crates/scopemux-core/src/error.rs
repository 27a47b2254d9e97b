//! Shared error type across scopemux crates.

use thiserror::Error;

/// JSON-RPC 2.0 error codes surfaced to callers (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcCode {
    /// The request object is malformed.
    InvalidRequest,
    /// The method does not exist or is not available.
    MethodNotFound,
    /// Invalid method parameter(s).
    InvalidParams,
    /// Internal JSON-RPC error.
    Internal,
}

impl RpcCode {
    /// Numeric code placed in the `error.code` field.
    pub fn as_i64(self) -> i64 {
        match self {
            RpcCode::InvalidRequest => -32600,
            RpcCode::MethodNotFound => -32601,
            RpcCode::InvalidParams => -32602,
            RpcCode::Internal => -32603,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ScopeMuxError>;

/// Unified error type used by core and engine.
#[derive(Debug, Error)]
pub enum ScopeMuxError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid scope: {0}")]
    InvalidScope(String),
    #[error("method not found: {0}")]
    MethodNotFound(String),
    /// A domain released a scope it never registered for.
    #[error("release without registration (scope={scope}, domain={domain})")]
    UnregisteredRelease { scope: String, domain: String },
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl ScopeMuxError {
    /// Map internal error to a stable JSON-RPC code.
    pub fn rpc_code(&self) -> RpcCode {
        match self {
            ScopeMuxError::BadRequest(_) => RpcCode::InvalidRequest,
            ScopeMuxError::InvalidScope(_) => RpcCode::InvalidParams,
            ScopeMuxError::MethodNotFound(_) => RpcCode::MethodNotFound,
            ScopeMuxError::UnregisteredRelease { .. } => RpcCode::Internal,
            ScopeMuxError::UnsupportedVersion => RpcCode::InvalidRequest,
            ScopeMuxError::Internal(_) => RpcCode::Internal,
        }
    }
}
