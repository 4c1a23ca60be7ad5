use crate::approval::{approval_request, ApprovalHandler, AutoApprove};
use crate::error::AgentError;
use crate::prompts::{enhanced_turn, system_prompt};
use crate::validation::validate_response;
use common::{AgentSettings, OperationTimer, RequestContext};
use database::{
    generate_session_id, ChatAnalytics, ChatInteraction, ChatLogger, ChatUser, Database,
    LlmLogData,
};
use domain::User;
use llm::{analyze_prompt_complexity, create_record, ChatMessage, ChatModel, TokenUsage, ToolCall};
use memory::SvDocumentManager;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tools::{toolset_for_role, SmsGateway, ToolContext, ToolRegistry};
use tracing::{debug, error, info, warn};

const DOC_CONTEXT_LIMIT: usize = 3;

pub const ITERATION_LIMIT_RESPONSE: &str = "I could not complete this request within the allowed \
number of steps. Please try a more specific question.";

/// Everything an agent needs besides the user it serves.
#[derive(Clone)]
pub struct AgentDeps {
    pub db: Arc<dyn Database>,
    pub model: Arc<dyn ChatModel>,
    pub chat_logger: Arc<ChatLogger>,
    pub docs: Option<Arc<SvDocumentManager>>,
    pub sms: SmsGateway,
    pub settings: AgentSettings,
    pub approval: Arc<dyn ApprovalHandler>,
}

impl AgentDeps {
    pub fn new(db: Arc<dyn Database>, model: Arc<dyn ChatModel>, chat_logger: Arc<ChatLogger>) -> Self {
        Self {
            db,
            model,
            chat_logger,
            docs: None,
            sms: SmsGateway::simulated(),
            settings: AgentSettings::default(),
            approval: Arc::new(AutoApprove),
        }
    }

    pub fn with_docs(mut self, docs: Arc<SvDocumentManager>) -> Self {
        self.docs = Some(docs);
        self
    }

    pub fn with_sms(mut self, sms: SmsGateway) -> Self {
        self.sms = sms;
        self
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_approval(mut self, approval: Arc<dyn ApprovalHandler>) -> Self {
        self.approval = approval;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserContext {
    pub user_id: String,
    pub name: String,
    pub role: String,
    pub school_id: Option<String>,
    pub reports_to: Option<String>,
    pub session_id: String,
}

/// Result of one successful turn.
struct TurnOutcome {
    response: String,
    tools_used: Vec<String>,
    llm_data: Option<LlmLogData>,
}

pub struct SvAgent {
    user: User,
    deps: AgentDeps,
    tools: ToolRegistry,
    system_prompt: String,
    session_id: String,
    /// Previous user/assistant exchanges, oldest first
    history: Vec<ChatMessage>,
}

impl SvAgent {
    pub async fn new(user_id: &str, deps: AgentDeps) -> Result<Self, AgentError> {
        let user = deps
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AgentError::UnknownUser(user_id.to_string()))?;

        let mut ctx = ToolContext::new(deps.db.clone()).with_sms(deps.sms.clone());
        if let Some(docs) = &deps.docs {
            ctx = ctx.with_docs(docs.clone());
        }
        let tools = toolset_for_role(user.role, &ctx);

        info!(
            user_id = %user.user_id,
            role = %user.role,
            tools = tools.len(),
            model = deps.model.model_name(),
            "Agent initialized"
        );

        Ok(Self {
            system_prompt: system_prompt(&user),
            session_id: generate_session_id(),
            history: Vec::new(),
            user,
            tools,
            deps,
        })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Names of the tools this user may call.
    pub fn tool_names(&self) -> &[String] {
        self.tools.names()
    }

    /// Answer one message. Failures become an apology; every turn is logged.
    pub async fn chat(&mut self, message: &str) -> String {
        let request = RequestContext::new().with_user(self.user.user_id.clone());
        let mut timer = OperationTimer::new("chat_turn");
        timer.add_field("request_id", &request.request_id);
        timer.add_field("user_id", &self.user.user_id);
        let complexity = analyze_prompt_complexity(message);
        timer.add_field("prompt_words", complexity.word_count);
        timer.add_field("prompt_asks_for_data", complexity.contains_data);

        let (response, tools_used, llm_data) = match self.run_turn(message).await {
            Ok(outcome) => (outcome.response, outcome.tools_used, outcome.llm_data),
            Err(e) => {
                error!(user_id = %self.user.user_id, "Agent error: {}", e);
                let response = format!(
                    "I apologize, but I encountered an error processing your request: {}. \
                     Please try again or contact support.",
                    e
                );
                (response, vec!["error".to_string()], None)
            }
        };

        let elapsed = request.start_time.elapsed().as_secs_f64();
        timer.add_field("tools_used", &tools_used);
        timer.finish();

        if let Err(e) = self
            .deps
            .chat_logger
            .log_interaction(
                &ChatUser::from(&self.user),
                message,
                &response,
                &tools_used,
                Some(elapsed),
                Some(&self.session_id),
                llm_data,
            )
            .await
        {
            warn!("Failed to log interaction: {}", e);
        }

        response
    }

    async fn run_turn(&mut self, message: &str) -> Result<TurnOutcome, AgentError> {
        let documentation = match &self.deps.docs {
            Some(docs) => {
                docs.get_relevant_documentation(message, None, DOC_CONTEXT_LIMIT)
                    .await
            }
            None => String::new(),
        };

        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage::user(enhanced_turn(&self.user, message, &documentation)));

        let definitions = self.tools.definitions();
        let temperature = self.deps.model.temperature();
        let mut usage = TokenUsage::default();
        let mut last_prompt = String::new();
        let mut model_used = self.deps.model.model_name().to_string();
        let mut tools_used: Vec<String> = Vec::new();
        let mut answer = None;

        for iteration in 0..self.deps.settings.max_iterations {
            let completion = self.deps.model.complete(&messages, &definitions).await?;

            let record = create_record(
                &messages,
                completion.content.as_deref().unwrap_or_default(),
                &completion.model,
                temperature,
                completion.usage,
            );
            usage.add(&TokenUsage::new(record.prompt_tokens, record.completion_tokens));
            last_prompt = record.llm_prompt;
            model_used = record.model_used;

            if !completion.wants_tools() {
                answer = Some(completion.content.unwrap_or_default());
                break;
            }

            debug!(
                iteration,
                calls = completion.tool_calls.len(),
                "Model requested tools"
            );
            messages.push(ChatMessage::assistant_with_tools(
                completion.content.unwrap_or_default(),
                completion.tool_calls.clone(),
            ));
            for call in &completion.tool_calls {
                let (result, executed) = self.dispatch(call).await;
                if executed && !tools_used.contains(&call.name) {
                    tools_used.push(call.name.clone());
                }
                messages.push(ChatMessage::tool(call.id.clone(), result));
            }
        }

        let response = match answer {
            Some(text) if self.deps.settings.validate_responses => validate_response(&text),
            Some(text) => text,
            None => {
                warn!(
                    max_iterations = self.deps.settings.max_iterations,
                    "Iteration limit reached"
                );
                ITERATION_LIMIT_RESPONSE.to_string()
            }
        };

        self.remember(message, &response);

        Ok(TurnOutcome {
            response,
            tools_used,
            llm_data: Some(LlmLogData {
                llm_prompt: last_prompt,
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
                model_used,
                temperature: f64::from(temperature),
            }),
        })
    }

    /// Run one requested call, enforcing the toolset and supervisor rules.
    /// The flag is false when the call was refused before reaching the tool.
    async fn dispatch(&self, call: &ToolCall) -> (String, bool) {
        if !self.tools.contains(&call.name) {
            warn!(tool = %call.name, role = %self.user.role, "Tool outside role toolset");
            let refusal = format!(
                "Tool '{}' is not available for the {} role",
                call.name,
                self.user.role.display_name()
            );
            return (refusal, false);
        }

        if let Some(request) = approval_request(&self.user, call) {
            if !self.deps.approval.approve(&request).await {
                info!(action = %request.action, "Supervised action denied");
                let denial = format!(
                    "Action '{}' was not approved by {}",
                    call.name, request.requires_role
                );
                return (denial, false);
            }
        }

        let output = self.tools.execute_call(&call.name, &call.arguments).await;
        debug!(tool = %call.name, success = output.success, "Tool finished");
        (output.result, true)
    }

    /// History is kept in whole user/assistant exchanges; the oldest go first.
    fn remember(&mut self, message: &str, response: &str) {
        self.history.push(ChatMessage::user(message));
        self.history.push(ChatMessage::assistant(response));
        let max_exchanges = self.deps.settings.history_limit / 2;
        let exchanges = self.history.len() / 2;
        if exchanges > max_exchanges {
            self.history.drain(..(exchanges - max_exchanges) * 2);
        }
    }

    pub fn get_user_context(&self) -> UserContext {
        UserContext {
            user_id: self.user.user_id.clone(),
            name: self.user.name.clone(),
            role: self.user.role.as_str().to_string(),
            school_id: self.user.school_id.clone(),
            reports_to: self.user.reports_to.clone(),
            session_id: self.session_id.clone(),
        }
    }

    pub async fn get_chat_history(&self, limit: usize) -> Vec<ChatInteraction> {
        self.deps
            .chat_logger
            .get_user_chat_history(&self.user.user_id, limit)
            .await
    }

    pub async fn get_session_analytics(&self) -> ChatAnalytics {
        self.deps.chat_logger.get_analytics().await
    }

    /// Forget the conversation so far; the session id is kept.
    pub fn clear_memory(&mut self) {
        self.history.clear();
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Cache this user's context in the vector store.
    pub async fn warm_vector_cache(&self) -> String {
        let Some(store) = self.deps.db.vector_store() else {
            return "Vector cache not available".to_string();
        };

        let context = json!({
            "role": self.user.role.as_str(),
            "school_id": self.user.school_id,
            "recent_activity": {"login": "success"},
            "preferences": {"interface": "cli"},
        });
        match store
            .cache_user_context(
                &self.user.user_id,
                self.user.role.as_str(),
                self.user.school_id.as_deref(),
                &context,
            )
            .await
        {
            Ok(()) => "Vector cache warmed successfully".to_string(),
            Err(e) => format!("Cache warming failed: {}", e),
        }
    }
}
