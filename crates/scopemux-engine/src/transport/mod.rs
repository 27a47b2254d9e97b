//! Transport layer (newline-delimited JSON-RPC over stdio).
//!
//! Submodules: codec (decode-once inbound parsing) and stdio (line loop).

pub mod codec;
pub mod stdio;
