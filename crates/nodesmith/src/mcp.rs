//! MCP engine integration
//!
//! Speaks newline-delimited JSON-RPC 2.0 to a Blender process spawned as a
//! child, over its captured stdin/stdout.
pub mod client;
pub mod protocol;
pub mod transport;

pub use client::EngineClient;
pub use protocol::{EngineError, EngineResult};
