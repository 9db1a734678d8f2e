use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A structured tool call surfaced from a model response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolUse {
    /// The name of the tool to invoke
    pub name: String,
    /// Arguments for the invocation
    pub arguments: Value,
    /// Provider correlation token; mandatory for the stateless-history
    /// dialect when returning the result, absent otherwise
    pub id: Option<String>,
}

impl ToolUse {
    pub fn new<S: Into<String>>(name: S, arguments: Value, id: Option<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
            id,
        }
    }
}

/// One normalized model exchange: free text plus at most one structured call.
///
/// Providers may return several calls in a single response; only the first is
/// surfaced and the rest are dropped. The loop acts on one call at a time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelTurn {
    pub text: String,
    pub call: Option<ToolUse>,
}

impl ModelTurn {
    pub fn text_only<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            call: None,
        }
    }

    pub fn with_call<S: Into<String>>(text: S, call: ToolUse) -> Self {
        Self {
            text: text.into(),
            call: Some(call),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_turn_roundtrip() {
        let turn = ModelTurn::with_call(
            "building it now",
            ToolUse::new("create_procedural_material", json!({"name": "Rust"}), None),
        );
        let serialized = serde_json::to_string(&turn).unwrap();
        let deserialized: ModelTurn = serde_json::from_str(&serialized).unwrap();
        assert_eq!(turn, deserialized);
    }

    #[test]
    fn test_default_turn_is_empty() {
        let turn = ModelTurn::default();
        assert!(turn.text.is_empty());
        assert!(turn.call.is_none());
    }
}
