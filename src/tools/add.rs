//! Addition Tool Implementation

use serde_json::Value;

use crate::core::error::ToolError;
use crate::core::protocol::MCPTool;
use crate::core::server::{ToolHandler, ToolRegistry};

pub const TOOL_NAME: &str = "add_numbers";

/// Add two numbers with plain IEEE-754 semantics.
pub fn add_numbers(a: f64, b: f64) -> f64 {
    a + b
}

/// Register the addition tool with the tool registry.
///
/// Both operands are required JSON numbers; integers are accepted and
/// widened to f64.
///
/// # Arguments
/// * `registry` - Registry the tool is added to
pub fn register(registry: &mut ToolRegistry) {
    let tool = MCPTool {
        name: TOOL_NAME.to_string(),
        description: "Add two numbers and return the result.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "a": { "type": "number", "description": "First operand" },
                "b": { "type": "number", "description": "Second operand" }
            },
            "required": ["a", "b"]
        }),
    };

    // Stateless handler: extract both operands, then add
    let handler: ToolHandler = Box::new(|args: Value| -> Result<Value, ToolError> {
        let a = number_arg(&args, "a")?;
        let b = number_arg(&args, "b")?;
        // Non-finite sums have no JSON representation and serialize as null
        Ok(serde_json::json!({ "result": add_numbers(a, b) }))
    });

    registry.register(tool, handler);
}

/// Extract a required numeric argument by name.
fn number_arg(args: &Value, name: &'static str) -> Result<f64, ToolError> {
    let value = args.get(name).ok_or(ToolError::MissingParameter(name))?;
    value.as_f64().ok_or(ToolError::InvalidParameter {
        name,
        expected: "a number",
    })
}
