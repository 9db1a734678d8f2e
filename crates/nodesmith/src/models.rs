//! These models represent the objects passed around by the agent
//!
//! There are a few related formats we need to interact with:
//! - gemini contents/parts and function declarations, sent to the LLM
//! - openai messages/tools, sent to the LLM
//! - MCP tool descriptors, advertised by the engine server
//!
//! These overlap without matching exactly, so payloads are converted to and
//! from the internal structs at each boundary.
pub mod tool;
pub mod turn;
