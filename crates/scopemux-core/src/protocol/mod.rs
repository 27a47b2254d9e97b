//! Protocol modules (JSON-RPC envelope + scope identifiers).
//!
//! - `rpc`: request/response objects with lazily parsed params.
//! - `scope`: `Scope` and `Domain` keys plus CAIP-2 validation.
//!
//! Parsers never panic: malformed input is reported as `ScopeMuxError`.

pub mod rpc;
pub mod scope;

pub use rpc::{RpcErrorObject, RpcRequest, RpcResponse, ScopedRequest};
pub use scope::{Domain, Scope};
