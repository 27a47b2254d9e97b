//! Scope-keyed, domain reference-counted middleware registry.

mod scoped;

pub use scoped::{ReleasePolicy, ScopedMiddlewareRegistry};
