//! scopemux engine library entry.
//!
//! This crate wires the scope registry, middleware contracts, pipeline,
//! config, metrics, and built-in middleware into a host stack. It is intended
//! to be consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod middleware;
pub mod obs;
pub mod pipeline;
pub mod registry;
pub mod services;
pub mod transport;

pub use middleware::{Downstream, MiddlewareFactory, MiddlewareHandle, ScopedMiddleware};
pub use pipeline::Pipeline;
pub use registry::{ReleasePolicy, ScopedMiddlewareRegistry};
