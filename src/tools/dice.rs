//! Dice Tool Implementation
//!
//! Rolls six-sided dice. The rolling itself is a pure function over an
//! injected random generator; the registered handler owns the server's
//! shared generator and adapts JSON arguments to it.

use std::sync::{Arc, Mutex, PoisonError};

use rand::Rng;
use rand::rngs::StdRng;
use serde_json::Value;

use crate::core::error::ToolError;
use crate::core::protocol::MCPTool;
use crate::core::server::{ToolHandler, ToolRegistry};

pub const TOOL_NAME: &str = "roll_dice";
pub const DIE_FACES: u32 = 6;
const DEFAULT_DICE: i64 = 1;

/// Process-wide random source shared by every dice invocation.
pub type SharedRng = Arc<Mutex<StdRng>>;

/// Roll `n_dice` independent six-sided dice.
///
/// Non-positive counts yield an empty sequence. The result buffer is
/// reserved fallibly: a count that cannot be allocated is reported as
/// `ToolError::TooManyDice`.
pub fn roll_dice<R: Rng + ?Sized>(rng: &mut R, n_dice: i64) -> Result<Vec<u32>, ToolError> {
    let count = usize::try_from(n_dice.max(0)).map_err(|_| ToolError::TooManyDice(n_dice))?;

    let mut rolls = Vec::new();
    rolls
        .try_reserve_exact(count)
        .map_err(|_| ToolError::TooManyDice(n_dice))?;

    // Capacity is already in place, so pushing never reallocates
    rolls.extend((0..count).map(|_| rng.random_range(1..=DIE_FACES)));
    Ok(rolls)
}

/// Register the dice tool with the tool registry.
///
/// # Arguments
/// * `registry` - Registry the tool is added to
/// * `rng` - Shared generator consumed by every call
pub fn register(registry: &mut ToolRegistry, rng: SharedRng) {
    let tool = MCPTool {
        name: TOOL_NAME.to_string(),
        description: "Roll a specified number of six-sided dice and return the results."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "n_dice": {
                    "type": "integer",
                    "default": DEFAULT_DICE,
                    "description": "Number of dice to roll"
                }
            }
        }),
    };

    // The handler owns its clone of the shared generator
    let handler: ToolHandler = Box::new(move |args: Value| -> Result<Value, ToolError> {
        // Validate arguments before taking the lock
        let n_dice = n_dice_arg(&args)?;

        // A poisoned lock still guards a valid generator
        let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
        let rolls = roll_dice(&mut *rng, n_dice)?;

        tracing::debug!(n_dice, rolled = rolls.len(), "rolled dice");
        Ok(serde_json::json!({ "result": rolls }))
    });

    registry.register(tool, handler);
}

/// Read `n_dice`, defaulting to one die when absent or null.
fn n_dice_arg(args: &Value) -> Result<i64, ToolError> {
    match args.get("n_dice") {
        None | Some(Value::Null) => Ok(DEFAULT_DICE),
        Some(value) => value.as_i64().ok_or(ToolError::InvalidParameter {
            name: "n_dice",
            expected: "an integer",
        }),
    }
}
