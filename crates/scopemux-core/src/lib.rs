//! scopemux core: JSON-RPC wire types, scope identifiers, and the error surface.
//!
//! This crate defines the contracts shared by the engine, built-in middleware,
//! and any embedding host. It intentionally carries no runtime dependencies so
//! it can be reused wherever requests are produced or consumed.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `ScopeMuxError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, ScopeMuxError};
pub use protocol::{Domain, RpcErrorObject, RpcRequest, RpcResponse, Scope, ScopedRequest};
