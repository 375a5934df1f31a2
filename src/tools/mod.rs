//! Tools module for Flashtutor
//!
//! This module contains the tool definitions offered to the model. Tools
//! here are structured-output schemas: the service never executes them,
//! it reads the arguments the model produced.

pub mod flashcard_generator;

use serde::{Deserialize, Serialize};

/// Tool definition structure
///
/// Represents a tool that can be called by the model, in the Anthropic
/// `tools` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Name of the tool
    pub name: String,
    /// Description of what the tool does and when to use it
    pub description: String,
    /// JSON schema for the tool's input
    pub input_schema: serde_json::Value,
}

impl Tool {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}
