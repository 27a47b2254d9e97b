//! Top-level facade crate for scopemux.
//!
//! Re-exports core types and the engine library so users can depend on a single crate.

pub mod core {
    pub use scopemux_core::*;
}

pub mod engine {
    pub use scopemux_engine::*;
}
