//! Tools the assistant can call on behalf of a signed-in user.
//!
//! Every tool reports business failures through [`ToolOutput::failure`];
//! the registry turns argument and backend errors into failure outputs so
//! the model always gets a readable string back.

use anyhow::Result;
use llm::ToolDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

pub mod communication_tools;
pub mod context;
pub mod data_tools;
pub mod documentation_tools;
pub mod enhanced_tools;
mod reports;
pub mod roles;

pub use communication_tools::{ReportGeneratorTool, SmsGateway, SmsSenderTool};
pub use context::ToolContext;
pub use data_tools::{
    LessonCompletionTool, LessonPlanTool, PropUpdateTool, PropsTool, ResidentsTool, TimetableTool,
};
pub use documentation_tools::{SvDocumentationTool, SvProcessGuideTool};
pub use enhanced_tools::{EnhancedReportTool, SemanticSearchTool, VectorCacheRefreshTool};
pub use roles::{tool_names_for_role, toolset_for_role};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Missing required argument '{0}'")]
    MissingArgument(String),

    #[error("Invalid value for '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    #[error("Tool arguments must be a JSON object, got: {0}")]
    NotAnObject(String),
}

/// Arguments of one call, as decoded from the model's JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolInput {
    pub args: Map<String, Value>,
}

impl ToolInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.args.insert(key.to_string(), value.into());
        self
    }

    /// Accepts an object, `null`, or a string holding a JSON object.
    pub fn from_value(value: Value) -> Result<Self, ToolError> {
        match value {
            Value::Object(args) => Ok(Self { args }),
            Value::Null => Ok(Self::default()),
            Value::String(raw) if raw.trim().is_empty() => Ok(Self::default()),
            Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(args)) => Ok(Self { args }),
                _ => Err(ToolError::NotAnObject(raw)),
            },
            other => Err(ToolError::NotAnObject(other.to_string())),
        }
    }

    /// String value of `key`; numbers are rendered, empty strings count as
    /// absent.
    pub fn optional_str(&self, key: &str) -> Option<String> {
        match self.args.get(key)? {
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn required_str(&self, key: &str) -> Result<String, ToolError> {
        self.optional_str(key)
            .ok_or_else(|| ToolError::MissingArgument(key.to_string()))
    }

    pub fn required_u32(&self, key: &str) -> Result<u32, ToolError> {
        let invalid = |message: String| ToolError::InvalidArgument {
            name: key.to_string(),
            message,
        };
        match self.args.get(key) {
            None | Some(Value::Null) => Err(ToolError::MissingArgument(key.to_string())),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| invalid(format!("{} is not a positive integer", n))),
            Some(Value::String(s)) => s
                .trim()
                .parse::<u32>()
                .map_err(|_| invalid(format!("'{}' is not a positive integer", s))),
            Some(other) => Err(invalid(format!("expected a number, got {}", other))),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.args.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub result: String,
}

impl ToolOutput {
    pub fn ok(result: impl Into<String>) -> Self {
        Self {
            success: true,
            result: result.into(),
        }
    }

    pub fn failure(result: impl Into<String>) -> Self {
        Self {
            success: false,
            result: result.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Wire name the model calls the tool by
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub input_schema: Value,
}

impl ToolSpec {
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.input_schema.clone(),
        }
    }
}

#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;
    async fn execute(&self, input: ToolInput) -> Result<ToolOutput>;
}

/// The tools available to one session, keyed by wire name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the tool's own name. A second tool with the same name
    /// is ignored.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.spec().name;
        if self.tools.contains_key(&name) {
            warn!(tool = %name, "Tool already registered, skipping duplicate");
            return;
        }
        self.order.push(name.clone());
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Names in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn list_tools(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.spec())
            .collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.list_tools().iter().map(ToolSpec::to_definition).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run `name`. Unknown tools and errors come back as failure outputs.
    pub async fn execute(&self, name: &str, input: ToolInput) -> ToolOutput {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = %name, "Unknown tool requested");
            return ToolOutput::failure(format!("Unknown tool: {}", name));
        };

        debug!(tool = %name, args = ?input.args, "Executing tool");
        match tool.execute(input).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %name, "Tool execution failed: {:#}", e);
                ToolOutput::failure(format!("Error executing {}: {}", name, e))
            }
        }
    }

    /// Run `name` with raw model arguments.
    pub async fn execute_call(&self, name: &str, arguments: &Value) -> ToolOutput {
        match ToolInput::from_value(arguments.clone()) {
            Ok(input) => self.execute(name, input).await,
            Err(e) => ToolOutput::failure(format!("Invalid arguments for {}: {}", name, e)),
        }
    }
}

pub(crate) fn object_schema(properties: Value, required: &[&str]) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_accessors() {
        let input = ToolInput::from_value(json!({
            "school_id": " SCH001 ",
            "period_number": "3",
            "count": 4,
            "empty": "",
            "force_refresh": true
        }))
        .unwrap();

        assert_eq!(input.required_str("school_id").unwrap(), "SCH001");
        assert_eq!(input.required_u32("period_number").unwrap(), 3);
        assert_eq!(input.required_u32("count").unwrap(), 4);
        assert_eq!(input.optional_str("count").as_deref(), Some("4"));
        assert_eq!(input.optional_str("empty"), None);
        assert!(input.bool_or("force_refresh", false));
        assert!(!input.bool_or("missing", false));

        assert!(matches!(
            input.required_str("section"),
            Err(ToolError::MissingArgument(_))
        ));
        assert!(matches!(
            input.required_u32("school_id"),
            Err(ToolError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_from_value_shapes() {
        assert!(ToolInput::from_value(Value::Null).unwrap().args.is_empty());
        let parsed = ToolInput::from_value(json!(r#"{"school_id":"SCH002"}"#)).unwrap();
        assert_eq!(parsed.optional_str("school_id").as_deref(), Some("SCH002"));
        assert!(ToolInput::from_value(json!("not json")).is_err());
        assert!(ToolInput::from_value(json!([1, 2])).is_err());
    }
}
