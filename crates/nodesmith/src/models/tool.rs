use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool the model can call through the engine.
///
/// The input schema is held in a canonical, provider-agnostic form with
/// lowercase primitive-type tags; provider dialects are derived from it
/// without mutating the canonical source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the tool, unique within the catalog
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// JSON schema for the tool's arguments
    pub input_schema: Value,
}

impl Tool {
    pub fn new<N, D>(name: N, description: D, input_schema: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}
