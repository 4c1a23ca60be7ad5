use anyhow::{anyhow, Result};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tools::{Tool, ToolInput, ToolOutput, ToolRegistry, ToolSpec};

struct MockTool {
    name: String,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockTool {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn failing(name: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }
}

#[async_trait::async_trait]
impl Tool for MockTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: format!("Mock tool {}", self.name),
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("backend unavailable"));
        }
        let who = input.optional_str("who").unwrap_or_else(|| "nobody".into());
        Ok(ToolOutput::ok(format!("Mock {} executed for {}", self.name, who)))
    }
}

#[test]
fn test_tool_registration() {
    let mut registry = ToolRegistry::new();
    assert!(registry.is_empty());

    registry.register(Box::new(MockTool::new("test_tool")));
    assert!(registry.contains("test_tool"));

    let spec = registry.get("test_tool").unwrap().spec();
    assert_eq!(spec.name, "test_tool");
    assert_eq!(spec.description, "Mock tool test_tool");
}

#[test]
fn test_duplicate_names_are_ignored() {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(MockTool::new("tool1")));
    registry.register(Box::new(MockTool::new("tool2")));
    registry.register(Box::new(MockTool::new("tool1")));

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.names(), &["tool1".to_string(), "tool2".to_string()]);

    let definitions = registry.definitions();
    assert_eq!(definitions.len(), 2);
    assert_eq!(definitions[1].name, "tool2");
    assert_eq!(definitions[1].parameters["type"], "object");
}

#[test]
fn test_get_nonexistent_tool() {
    let registry = ToolRegistry::new();
    assert!(registry.get("nonexistent").is_none());
}

#[tokio::test]
async fn test_tool_execution() {
    let tool = MockTool::new("executor");
    let calls = tool.calls.clone();
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(tool));

    let output = registry
        .execute("executor", ToolInput::new().with("who", "R001"))
        .await;
    assert!(output.success);
    assert_eq!(output.result, "Mock executor executed for R001");

    let output = registry
        .execute_call("executor", &json!(r#"{"who": "DM001"}"#))
        .await;
    assert_eq!(output.result, "Mock executor executed for DM001");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failures_become_outputs() {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(MockTool::failing("flaky")));

    let output = registry.execute("flaky", ToolInput::new()).await;
    assert_eq!(
        output,
        ToolOutput::failure("Error executing flaky: backend unavailable")
    );

    let output = registry.execute("missing_tool", ToolInput::new()).await;
    assert!(!output.success);
    assert_eq!(output.result, "Unknown tool: missing_tool");

    let output = registry.execute_call("flaky", &json!([1, 2, 3])).await;
    assert!(!output.success);
    assert!(output.result.starts_with("Invalid arguments for flaky"));
}
