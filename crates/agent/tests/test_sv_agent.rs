use agent::{
    AgentDeps, AgentError, ApprovalHandler, ApprovalRequest, SvAgent, ITERATION_LIMIT_RESPONSE,
};
use async_trait::async_trait;
use common::{AgentSettings, LlmError};
use database::{ChatLogger, Database, TextDatabase};
use llm::{ChatCompletion, ChatMessage, ChatModel, MessageRole, TokenUsage, ToolCall, ToolDefinition};
use memory::{HashingEmbedder, VectorStore};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Replays canned completions and records every request it receives.
#[derive(Default)]
struct ScriptedModel {
    script: Mutex<VecDeque<ChatCompletion>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    offered_tools: Mutex<Vec<String>>,
    repeat_last: bool,
}

impl ScriptedModel {
    fn new(script: Vec<ChatCompletion>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    fn endless(completion: ChatCompletion) -> Self {
        Self {
            repeat_last: true,
            ..Self::new(vec![completion])
        }
    }

    fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatCompletion, LlmError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        *self.offered_tools.lock().unwrap() = tools.iter().map(|t| t.name.clone()).collect();

        let mut script = self.script.lock().unwrap();
        if self.repeat_last {
            return script.front().cloned().ok_or(LlmError::EmptyResponse);
        }
        script.pop_front().ok_or(LlmError::EmptyResponse)
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }

    fn temperature(&self) -> f32 {
        0.0
    }
}

struct DenyAll;

#[async_trait]
impl ApprovalHandler for DenyAll {
    async fn approve(&self, _request: &ApprovalRequest) -> bool {
        false
    }
}

fn text(content: &str) -> ChatCompletion {
    ChatCompletion {
        usage: Some(TokenUsage::new(120, 30)),
        ..ChatCompletion::text(content, "scripted-model")
    }
}

fn tool_call(name: &str, arguments: Value) -> ChatCompletion {
    ChatCompletion {
        content: None,
        tool_calls: vec![ToolCall {
            id: format!("call_{}", name),
            name: name.to_string(),
            arguments,
        }],
        usage: Some(TokenUsage::new(100, 10)),
        model: "scripted-model".to_string(),
    }
}

fn seed_tables(dir: &std::path::Path) {
    let tables = [
        (
            "users.txt",
            "user_id|password|role|name|school_id|reports_to\n\
             R001|r123|R|Ravi Kumar|SCH001|DM001\n\
             DM001|dm123|DM|Deepa Menon||RM001\n\
             P001|p123|PRINCIPAL|Priya Nair|SCH001|\n",
        ),
        (
            "timetables.txt",
            "school_id|class|section|period_number|time_slot|subject|is_pe_period\n\
             SCH001|V|A|1|09:00-09:40|Mathematics|false\n\
             SCH001|V|A|2|09:40-10:20|Physical Education|true\n",
        ),
        ("lesson_plans.txt", "lesson_plan_id|school_id|session|lessons\n"),
        ("lessons.txt", "lesson_id|name|description|duration|required_props\n"),
        (
            "props.txt",
            "prop_id|type|school_id|quantity|available|status\n\
             PROP002|cones|SCH001|20|0|damaged\n",
        ),
        ("events.txt", "event_id|school_id|name|date|description\n"),
    ];
    for (name, contents) in tables {
        std::fs::write(dir.join(name), contents).unwrap();
    }
}

struct Fixture {
    _dir: TempDir,
    db: Arc<TextDatabase>,
    logger: Arc<ChatLogger>,
}

impl Fixture {
    async fn new() -> Self {
        Self::build(false).await
    }

    async fn with_vector_store() -> Self {
        Self::build(true).await
    }

    async fn build(vectors: bool) -> Self {
        let dir = TempDir::new().unwrap();
        seed_tables(dir.path());
        let store = if vectors {
            Some(Arc::new(
                VectorStore::open(dir.path().join("vectors"), Arc::new(HashingEmbedder::new(32)))
                    .await
                    .unwrap(),
            ))
        } else {
            None
        };
        let db = Arc::new(TextDatabase::open(dir.path(), store).await.unwrap());
        let logger = Arc::new(ChatLogger::open(dir.path().join("logs")).await.unwrap());
        Self {
            _dir: dir,
            db,
            logger,
        }
    }

    fn deps(&self, model: Arc<ScriptedModel>) -> AgentDeps {
        AgentDeps::new(self.db.clone(), model, self.logger.clone())
    }
}

#[tokio::test]
async fn test_unknown_user_is_rejected() {
    let fixture = Fixture::new().await;
    let model = Arc::new(ScriptedModel::new(vec![]));

    let result = SvAgent::new("X999", fixture.deps(model)).await;
    assert!(matches!(result, Err(AgentError::UnknownUser(ref id)) if id == "X999"));
}

#[tokio::test]
async fn test_plain_answer_is_logged_with_usage() {
    let fixture = Fixture::new().await;
    let model = Arc::new(ScriptedModel::new(vec![text("Period 2 is PE for class V-A.")]));
    let mut agent = SvAgent::new("R001", fixture.deps(model.clone())).await.unwrap();

    let response = agent.chat("When is PE for V-A?").await;
    assert_eq!(response, "Period 2 is PE for class V-A.");

    let requests = model.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0][0].role, MessageRole::System);
    assert!(requests[0][0].content.contains("helping Ravi Kumar (R)"));
    let turn = &requests[0][1].content;
    assert!(turn.starts_with("User: Ravi Kumar (R)\nSchool: SCH001\nQuery: When is PE for V-A?"));
    assert!(turn.contains("No specific SV documentation found for this query"));

    let offered = model.offered_tools.lock().unwrap().clone();
    assert!(offered.contains(&"lesson_completion_tool".to_string()));
    assert!(!offered.contains(&"report_generator_tool".to_string()));

    let history = agent.get_chat_history(10).await;
    assert_eq!(history.len(), 1);
    let logged = &history[0];
    assert_eq!(logged.session_id, agent.session_id());
    assert!(logged.interaction.tools_used.is_empty());
    assert!(logged.interaction.response_time_seconds.is_some());
    assert_eq!(logged.llm_analytics.model_used, "scripted-model");
    assert_eq!(logged.llm_analytics.total_tokens, 150);
}

#[tokio::test]
async fn test_tool_results_feed_back_into_the_model() {
    let fixture = Fixture::new().await;
    let model = Arc::new(ScriptedModel::new(vec![
        tool_call(
            "timetable_tool",
            json!({"school_id": "SCH001", "class_name": "V", "section": "A"}),
        ),
        text("Class V-A has PE in period 2."),
    ]));
    let mut agent = SvAgent::new("DM001", fixture.deps(model.clone())).await.unwrap();

    let response = agent.chat("Show the V-A timetable").await;
    assert_eq!(response, "Class V-A has PE in period 2.");

    let requests = model.requests();
    assert_eq!(requests.len(), 2);
    let second = &requests[1];
    let assistant = &second[second.len() - 2];
    assert_eq!(assistant.tool_calls[0].name, "timetable_tool");
    let tool_result = second.last().unwrap();
    assert_eq!(tool_result.role, MessageRole::Tool);
    assert_eq!(tool_result.tool_call_id.as_deref(), Some("call_timetable_tool"));
    assert!(tool_result
        .content
        .starts_with("Timetable for School SCH001, Class V, Section A:"));

    let history = agent.get_chat_history(1).await;
    assert_eq!(history[0].interaction.tools_used, vec!["timetable_tool".to_string()]);
    assert_eq!(history[0].llm_analytics.total_tokens, 110 + 150);
}

#[tokio::test]
async fn test_denied_resident_action_is_not_executed() {
    let fixture = Fixture::new().await;
    let model = Arc::new(ScriptedModel::new(vec![
        tool_call(
            "prop_update_tool",
            json!({"prop_id": "PROP002", "status": "good", "resident_id": "R001"}),
        ),
        text("Your supervisor did not approve the change."),
    ]));
    let deps = fixture.deps(model.clone()).with_approval(Arc::new(DenyAll));
    let mut agent = SvAgent::new("R001", deps).await.unwrap();

    agent.chat("Mark the cones as good").await;

    let requests = model.requests();
    assert_eq!(
        requests[1].last().unwrap().content,
        "Action 'prop_update_tool' was not approved by DM"
    );
    let props = fixture.db.get_props(Some("SCH001")).await.unwrap();
    assert_eq!(props[0].status, "damaged");

    let history = agent.get_chat_history(1).await;
    assert!(history[0].interaction.tools_used.is_empty());
}

#[tokio::test]
async fn test_auto_approved_resident_action_runs() {
    let fixture = Fixture::new().await;
    let model = Arc::new(ScriptedModel::new(vec![
        tool_call(
            "prop_update_tool",
            json!({"prop_id": "PROP002", "status": "good", "resident_id": "R001"}),
        ),
        text("Done."),
    ]));
    let mut agent = SvAgent::new("R001", fixture.deps(model.clone())).await.unwrap();

    agent.chat("Mark the cones as good").await;

    let requests = model.requests();
    assert!(requests[1]
        .last()
        .unwrap()
        .content
        .starts_with("Successfully updated prop PROP002 status to good"));
    let props = fixture.db.get_props(Some("SCH001")).await.unwrap();
    assert_eq!(props[0].status, "good");
}

#[tokio::test]
async fn test_tools_outside_role_are_refused() {
    let fixture = Fixture::new().await;
    let model = Arc::new(ScriptedModel::new(vec![
        tool_call("lesson_completion_tool", json!({"school_id": "SCH001"})),
        text("I cannot log lessons for you."),
    ]));
    let mut agent = SvAgent::new("P001", fixture.deps(model.clone())).await.unwrap();
    assert!(!agent.tool_names().contains(&"lesson_completion_tool".to_string()));

    agent.chat("Log period 2 as done").await;

    let requests = model.requests();
    assert_eq!(
        requests[1].last().unwrap().content,
        "Tool 'lesson_completion_tool' is not available for the School Principal role"
    );
    let history = agent.get_chat_history(1).await;
    assert!(history[0].interaction.tools_used.is_empty());
}

#[tokio::test]
async fn test_validation_can_be_disabled() {
    let fixture = Fixture::new().await;
    let hedged = "The cones are probably in the store room.";

    let model = Arc::new(ScriptedModel::new(vec![text(hedged)]));
    let mut agent = SvAgent::new("R001", fixture.deps(model)).await.unwrap();
    assert!(agent.chat("Where are the cones?").await.starts_with("I need to verify this information"));

    let model = Arc::new(ScriptedModel::new(vec![text(hedged)]));
    let settings = AgentSettings {
        validate_responses: false,
        ..AgentSettings::default()
    };
    let mut agent = SvAgent::new("R001", fixture.deps(model).with_settings(settings))
        .await
        .unwrap();
    assert_eq!(agent.chat("Where are the cones?").await, hedged);
}

#[tokio::test]
async fn test_iteration_limit() {
    let fixture = Fixture::new().await;
    let model = Arc::new(ScriptedModel::endless(tool_call(
        "props_tool",
        json!({"school_id": "SCH001"}),
    )));
    let settings = AgentSettings {
        max_iterations: 2,
        ..AgentSettings::default()
    };
    let mut agent = SvAgent::new("DM001", fixture.deps(model.clone()).with_settings(settings))
        .await
        .unwrap();

    assert_eq!(agent.chat("List props").await, ITERATION_LIMIT_RESPONSE);
    assert_eq!(model.requests().len(), 2);
}

#[tokio::test]
async fn test_model_failure_becomes_apology() {
    let fixture = Fixture::new().await;
    let model = Arc::new(ScriptedModel::new(vec![]));
    let mut agent = SvAgent::new("R001", fixture.deps(model)).await.unwrap();

    let response = agent.chat("Hello").await;
    assert_eq!(
        response,
        "I apologize, but I encountered an error processing your request: \
         LLM error: Model returned an empty response. Please try again or contact support."
    );

    let history = agent.get_chat_history(5).await;
    assert_eq!(history[0].interaction.tools_used, vec!["error".to_string()]);
    assert_eq!(history[0].llm_analytics.total_tokens, 0);
    assert_eq!(agent.history_len(), 0);
}

#[tokio::test]
async fn test_conversation_memory() {
    let fixture = Fixture::new().await;
    let model = Arc::new(ScriptedModel::new(vec![
        text("Hello Ravi."),
        text("You asked about greetings."),
        text("Fresh start."),
    ]));
    let settings = AgentSettings {
        history_limit: 2,
        ..AgentSettings::default()
    };
    let mut agent = SvAgent::new("R001", fixture.deps(model.clone()).with_settings(settings))
        .await
        .unwrap();

    agent.chat("Hi").await;
    agent.chat("What did I ask?").await;
    assert_eq!(agent.history_len(), 2);

    let requests = model.requests();
    assert_eq!(requests[1].len(), 4);
    assert_eq!(requests[1][1].content, "Hi");
    assert_eq!(requests[1][2].content, "Hello Ravi.");

    agent.clear_memory();
    agent.chat("Start over").await;
    assert_eq!(model.requests()[2].len(), 2);

    let analytics = agent.get_session_analytics().await;
    assert_eq!(analytics.total_interactions, 3);
}

#[tokio::test]
async fn test_odd_history_limit_keeps_whole_exchanges() {
    let fixture = Fixture::new().await;
    let model = Arc::new(ScriptedModel::new(vec![
        text("One."),
        text("Two."),
        text("Three."),
    ]));
    let settings = AgentSettings {
        history_limit: 3,
        ..AgentSettings::default()
    };
    let mut agent = SvAgent::new("R001", fixture.deps(model.clone()).with_settings(settings))
        .await
        .unwrap();

    agent.chat("First").await;
    agent.chat("Second").await;
    assert_eq!(agent.history_len(), 2);
    agent.chat("Third").await;

    let third = &model.requests()[2];
    assert_eq!(third.len(), 4);
    assert_eq!(third[1].role, MessageRole::User);
    assert_eq!(third[1].content, "Second");
    assert_eq!(third[2].role, MessageRole::Assistant);
    assert_eq!(third[2].content, "Two.");
}

#[tokio::test]
async fn test_user_context_and_cache_warming() {
    let fixture = Fixture::new().await;
    let model = Arc::new(ScriptedModel::new(vec![]));
    let agent = SvAgent::new("R001", fixture.deps(model)).await.unwrap();

    let context = agent.get_user_context();
    assert_eq!(context.role, "R");
    assert_eq!(context.school_id.as_deref(), Some("SCH001"));
    assert_eq!(context.reports_to.as_deref(), Some("DM001"));
    assert_eq!(agent.warm_vector_cache().await, "Vector cache not available");

    let fixture = Fixture::with_vector_store().await;
    let model = Arc::new(ScriptedModel::new(vec![]));
    let agent = SvAgent::new("R001", fixture.deps(model)).await.unwrap();
    assert_eq!(agent.warm_vector_cache().await, "Vector cache warmed successfully");

    let store = fixture.db.vector_store().unwrap();
    let cached = store.get_cached_context("R001").await.unwrap();
    assert_eq!(cached["recent_activity"]["login"], "success");
}
