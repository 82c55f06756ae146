//! Parsed tool output records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single structured result emitted by a tool's parser.
///
/// Shape varies per stage, so beyond the two fields every
/// adapter always fills in, the remainder is carried as a loose JSON
/// object with typed accessors for the well-known keys the pipeline
/// engine's projections read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedRecord {
    pub source_tool: String,
    pub target: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ParsedRecord {
    pub fn new(source_tool: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source_tool: source_tool.into(),
            target: target.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn host(&self) -> Option<&str> {
        self.fields.get("host").and_then(Value::as_str)
    }

    pub fn url(&self) -> Option<&str> {
        self.fields.get("url").and_then(Value::as_str)
    }

    pub fn port(&self) -> Option<&str> {
        self.fields.get("port").and_then(Value::as_str)
    }

    pub fn status(&self) -> Option<i64> {
        self.fields.get("status").and_then(Value::as_i64)
    }
}
