//! JSON-RPC 2.0 envelope.
//!
//! `params` is kept as `RawValue` so middleware parses only what it handles.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::ScopeMuxError;
use crate::protocol::scope::Scope;

pub const JSONRPC_VERSION: &str = "2.0";

/// Inbound request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RpcRequest {
    /// Protocol version, always "2.0".
    pub jsonrpc: String,
    /// Request id (number, string, or null).
    #[serde(default)]
    pub id: Value,
    pub method: String,
    /// Optional params, stored as raw JSON (lazy parsing).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Box<RawValue>>,
    /// Chain scope this request targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    /// Requesting origin; hosts use it as the reference-counting domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl RpcRequest {
    pub fn new(id: impl Into<Value>, method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params: None,
            scope: None,
            origin: None,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<Scope>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Extracts the routing scope from a request.
pub trait ScopedRequest {
    fn scope(&self) -> Option<&Scope>;
}

impl ScopedRequest for RpcRequest {
    fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }
}

/// Error member of a response.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<&ScopeMuxError> for RpcErrorObject {
    fn from(e: &ScopeMuxError) -> Self {
        Self {
            code: e.rpc_code().as_i64(),
            message: e.to_string(),
            data: None,
        }
    }
}

/// Outbound response. Middleware fills either `result` or `error`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Empty response carrying the request's id.
    pub fn for_request(req: &RpcRequest) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: req.id.clone(),
            result: None,
            error: None,
        }
    }

    pub fn set_result(&mut self, v: Value) {
        self.error = None;
        self.result = Some(v);
    }

    pub fn set_error(&mut self, e: &ScopeMuxError) {
        self.result = None;
        self.error = Some(RpcErrorObject::from(e));
    }

    /// True once a middleware has written a result or an error.
    pub fn is_complete(&self) -> bool {
        self.result.is_some() || self.error.is_some()
    }
}
