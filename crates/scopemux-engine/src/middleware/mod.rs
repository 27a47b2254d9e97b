//! Middleware contracts.
//!
//! Re-exports the handle and trait seams so downstream consumers can depend on
//! this module directly.

pub mod handle;

pub use handle::{Downstream, MiddlewareFactory, MiddlewareHandle, ScopedMiddleware};
