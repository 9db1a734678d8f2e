use anyhow::{anyhow, Result};
use serde_json::{json, Map, Value};

use crate::models::tool::Tool;

/// Primitive-type tag casing expected by a provider dialect.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TypeCase {
    /// Gemini function declarations: `OBJECT`, `STRING`, ...
    Upper,
    /// OpenAI function parameters: `object`, `string`, ...
    Lower,
}

/// Recase every `type` tag in a schema, returning a new value.
///
/// The transform is total and idempotent; the canonical input is never
/// mutated.
pub fn transform_type_case(schema: &Value, case: TypeCase) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                let converted = if key == "type" && value.is_string() {
                    let tag = value.as_str().unwrap_or_default();
                    match case {
                        TypeCase::Upper => Value::String(tag.to_uppercase()),
                        TypeCase::Lower => Value::String(tag.to_lowercase()),
                    }
                } else {
                    transform_type_case(value, case)
                };
                out.insert(key.clone(), converted);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| transform_type_case(item, case))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Convert the canonical catalog to OpenAI's tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": transform_type_case(&tool.input_schema, TypeCase::Lower),
            }
        }));
    }

    Ok(result)
}

/// Convert the canonical catalog to Gemini's function declarations
pub fn tools_to_gemini_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut declarations = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        declarations.push(json!({
            "name": tool.name,
            "description": tool.description,
            "parameters": transform_type_case(&tool.input_schema, TypeCase::Upper),
        }));
    }

    Ok(declarations)
}

/// Prompt for the one-shot planning call shared by both dialects.
pub fn plan_prompt(request: &str) -> String {
    format!(
        "Break the following request into a short, ordered list of subtasks \
         for building a procedural material in Blender. Respond with only a \
         JSON array of strings.\n\nRequest: {}",
        request
    )
}

/// Parse an ordered subtask list out of a planning response.
///
/// Models wrap the array in markdown fences or prose often enough that we
/// cut from the first `[` to the last `]` before parsing.
pub fn parse_plan_text(text: &str) -> Result<Vec<String>> {
    let start = text
        .find('[')
        .ok_or_else(|| anyhow!("No plan array in response: {}", text))?;
    let end = text
        .rfind(']')
        .ok_or_else(|| anyhow!("No plan array in response: {}", text))?;
    if end < start {
        return Err(anyhow!("No plan array in response: {}", text));
    }

    let plan: Vec<String> = serde_json::from_str(&text[start..=end])
        .map_err(|e| anyhow!("Could not parse plan: {}", e))?;
    if plan.is_empty() {
        return Err(anyhow!("Planner returned an empty plan"));
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Name of the material"},
                "steps": {"type": "array", "items": {"type": "integer"}}
            },
            "required": ["name"]
        })
    }

    #[test]
    fn test_transform_upper() {
        let upper = transform_type_case(&sample_schema(), TypeCase::Upper);
        assert_eq!(upper["type"], "OBJECT");
        assert_eq!(upper["properties"]["name"]["type"], "STRING");
        assert_eq!(upper["properties"]["steps"]["items"]["type"], "INTEGER");
        // non-type fields untouched
        assert_eq!(
            upper["properties"]["name"]["description"],
            "Name of the material"
        );
    }

    #[test]
    fn test_transform_does_not_mutate_source() {
        let canonical = sample_schema();
        let _ = transform_type_case(&canonical, TypeCase::Upper);
        assert_eq!(canonical, sample_schema());
    }

    #[test]
    fn test_transform_is_idempotent() {
        let once = transform_type_case(&sample_schema(), TypeCase::Lower);
        let twice = transform_type_case(&once, TypeCase::Lower);
        assert_eq!(once, twice);

        let upper_once = transform_type_case(&sample_schema(), TypeCase::Upper);
        let upper_twice = transform_type_case(&upper_once, TypeCase::Upper);
        assert_eq!(upper_once, upper_twice);
    }

    #[test]
    fn test_tools_to_openai_spec() {
        let tool = Tool::new("test_tool", "A test tool", sample_schema());
        let spec = tools_to_openai_spec(&[tool]).unwrap();

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["type"], "function");
        assert_eq!(spec[0]["function"]["name"], "test_tool");
        assert_eq!(spec[0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_tools_to_gemini_spec() {
        let tool = Tool::new("test_tool", "A test tool", sample_schema());
        let spec = tools_to_gemini_spec(&[tool]).unwrap();

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["name"], "test_tool");
        assert_eq!(spec[0]["parameters"]["type"], "OBJECT");
    }

    #[test]
    fn test_duplicate_tool_name_rejected() {
        let tools = vec![
            Tool::new("dup", "first", json!({"type": "object"})),
            Tool::new("dup", "second", json!({"type": "object"})),
        ];
        assert!(tools_to_openai_spec(&tools).is_err());
        assert!(tools_to_gemini_spec(&tools).is_err());
    }

    #[test]
    fn test_parse_plan_plain_array() {
        let plan = parse_plan_text(r#"["create base color", "add noise texture"]"#).unwrap();
        assert_eq!(plan, vec!["create base color", "add noise texture"]);
    }

    #[test]
    fn test_parse_plan_fenced() {
        let text = "Here is the plan:\n```json\n[\"step one\", \"step two\"]\n```\n";
        let plan = parse_plan_text(text).unwrap();
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_parse_plan_rejects_garbage() {
        assert!(parse_plan_text("no array here").is_err());
        assert!(parse_plan_text("[]").is_err());
    }
}
