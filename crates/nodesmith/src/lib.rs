pub mod agent;
pub mod catalog;
pub mod errors;
pub mod logger;
pub mod mcp;
pub mod models;
pub mod providers;
pub mod retrieval;
