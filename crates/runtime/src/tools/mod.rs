//! Builtin tools and the registry that dispatches to them.
//!
//! Dispatch never fails the turn: unknown tools and malformed arguments
//! are converted into descriptive text for the model to read, not
//! errors for the orchestrator to handle.

mod clock;
mod math;
mod weather;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use gateway::ToolDefinition;

/// Internal failures on the tool path. These never cross the registry
/// boundary; [`ToolRegistry::dispatch`] renders them as result text.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("invalid expression: {0}")]
    InvalidExpression(String),
}

/// The enumerated set of locally-implemented tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Weather,
    Clock,
    Math,
}

impl Builtin {
    const ALL: [Builtin; 3] = [Builtin::Weather, Builtin::Clock, Builtin::Math];

    fn from_name(name: &str) -> Option<Self> {
        match name {
            weather::NAME => Some(Self::Weather),
            clock::NAME => Some(Self::Clock),
            math::NAME => Some(Self::Math),
            _ => None,
        }
    }

    fn definition(self) -> ToolDefinition {
        match self {
            Self::Weather => weather::definition(),
            Self::Clock => clock::definition(),
            Self::Math => math::definition(),
        }
    }

    fn run(self, arguments: &Value) -> Result<String, ToolError> {
        match self {
            Self::Weather => weather::run(arguments),
            Self::Clock => clock::run(arguments),
            Self::Math => math::run(arguments),
        }
    }
}

/// Registry of callable tools: schemas for advertising plus dispatch.
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// Registry with all builtin tools, in stable order.
    pub fn builtin() -> Self {
        Self {
            definitions: Builtin::ALL.iter().map(|b| b.definition()).collect(),
        }
    }

    /// Tool definitions, advertised to the model verbatim.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Execute a tool call. The returned string always makes sense as
    /// tool-message content; failures come back as descriptive text.
    pub fn dispatch(&self, name: &str, raw_arguments: &str) -> String {
        match self.try_dispatch(name, raw_arguments) {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = name, error = %e, "tool dispatch failed");
                e.to_string()
            }
        }
    }

    fn try_dispatch(&self, name: &str, raw_arguments: &str) -> Result<String, ToolError> {
        let builtin =
            Builtin::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let arguments: Value = serde_json::from_str(raw_arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        debug!(tool = name, %arguments, "dispatching tool");
        builtin.run(&arguments)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
