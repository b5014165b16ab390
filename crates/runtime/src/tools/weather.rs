//! Weather lookup tool (canned data).

use serde::Deserialize;
use serde_json::{Value, json};

use super::ToolError;
use gateway::ToolDefinition;

pub const NAME: &str = "get_current_weather";

// Simulated observations, temperatures in celsius.
const WEATHER_DATA: &[(&str, i32, &str, u32)] = &[
    ("Moscow, Russia", -5, "snow", 85),
    ("London, UK", 8, "rain", 90),
    ("New York, USA", 15, "clear", 65),
    ("Tokyo, Japan", 12, "cloudy", 70),
];

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: "Get the current weather in a given city".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City and country, e.g. 'Moscow, Russia'",
                },
                "unit": {
                    "type": "string",
                    "enum": ["celsius", "fahrenheit"],
                    "description": "Temperature unit",
                }
            },
            "required": ["location"],
        }),
    }
}

#[derive(Debug, Deserialize)]
struct Args {
    location: String,
    #[serde(default)]
    unit: Option<Unit>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Unit {
    #[default]
    Celsius,
    Fahrenheit,
}

pub fn run(arguments: &Value) -> Result<String, ToolError> {
    let args: Args = serde_json::from_value(arguments.clone())
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

    let Some(&(_, temp_c, condition, humidity)) = WEATHER_DATA
        .iter()
        .find(|(location, ..)| *location == args.location)
    else {
        return Ok(format!(
            "Weather for {}: data temporarily unavailable",
            args.location
        ));
    };

    let (temp, unit) = match args.unit.unwrap_or_default() {
        Unit::Celsius => (temp_c, "°C"),
        Unit::Fahrenheit => (temp_c * 9 / 5 + 32, "°F"),
    };
    Ok(format!(
        "Weather in {}: {temp}{unit}, {condition}, humidity {humidity}%",
        args.location
    ))
}
