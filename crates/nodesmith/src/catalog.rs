//! The material tool catalog, declared once in the canonical dialect.

use serde_json::json;

use crate::models::tool::Tool;

pub const CREATE_MATERIAL_TOOL: &str = "create_procedural_material";
pub const LIST_MATERIALS_TOOL: &str = "list_materials";
pub const SAVE_BLEND_TOOL: &str = "save_blend_file";

/// The three tools the engine server exposes.
pub fn material_tools() -> Vec<Tool> {
    vec![
        Tool::new(
            CREATE_MATERIAL_TOOL,
            "Generate a 3D procedural material implementation in Blender nodes.",
            json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Name of the material"
                    },
                    "python_code": {
                        "type": "string",
                        "description": "Create a blender procedural material from user input \
                            using Blender 4.5's Python API. Do not use image nodes or embed \
                            images. 'ShaderNodeTexMusgrave' is removed in 4.5; use \
                            'ShaderNodeTexNoise' instead. For Principled BSDF, use \
                            'Specular IOR Level' instead of 'Specular'."
                    }
                },
                "required": ["name", "python_code"]
            }),
        ),
        Tool::new(
            LIST_MATERIALS_TOOL,
            "List existing materials.",
            json!({
                "type": "object",
                "properties": {}
            }),
        ),
        Tool::new(
            SAVE_BLEND_TOOL,
            "Save the current Blender file to disk.",
            json!({
                "type": "object",
                "properties": {
                    "filepath": {
                        "type": "string",
                        "description": "Path to save the .blend file (e.g., 'output.blend')"
                    }
                },
                "required": ["filepath"]
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_and_required_fields() {
        let tools = material_tools();
        assert_eq!(tools.len(), 3);

        let create = &tools[0];
        assert_eq!(create.name, "create_procedural_material");
        assert_eq!(
            create.input_schema["required"],
            serde_json::json!(["name", "python_code"])
        );

        let list = &tools[1];
        assert_eq!(list.name, "list_materials");
        assert!(list.input_schema["properties"]
            .as_object()
            .unwrap()
            .is_empty());

        let save = &tools[2];
        assert_eq!(save.name, "save_blend_file");
        assert_eq!(save.input_schema["required"], serde_json::json!(["filepath"]));
    }

    #[test]
    fn test_catalog_is_canonical_lowercase() {
        for tool in material_tools() {
            assert_eq!(tool.input_schema["type"], "object");
        }
    }
}
