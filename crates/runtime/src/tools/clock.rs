//! Local-time lookup tool (canned data).

use serde::Deserialize;
use serde_json::{Value, json};

use super::ToolError;
use gateway::ToolDefinition;

pub const NAME: &str = "get_current_time";

const TIME_DATA: &[(&str, &str)] = &[
    ("Moscow", "15:30 (MSK)"),
    ("London", "12:30 (GMT)"),
    ("New York", "07:30 (EST)"),
    ("Tokyo", "21:30 (JST)"),
];

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: "Get the current time in a given city".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City to look up, e.g. 'London' or 'Moscow'",
                }
            },
            "required": ["location"],
        }),
    }
}

#[derive(Debug, Deserialize)]
struct Args {
    location: String,
}

pub fn run(arguments: &Value) -> Result<String, ToolError> {
    let args: Args = serde_json::from_value(arguments.clone())
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

    match TIME_DATA
        .iter()
        .find(|(location, _)| *location == args.location)
    {
        Some((_, time)) => Ok(format!("Current time in {}: {time}", args.location)),
        None => Ok(format!(
            "Time for {}: data temporarily unavailable",
            args.location
        )),
    }
}
