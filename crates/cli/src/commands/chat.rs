use crate::progress::ActiveSpinner;
use crate::runtime::Runtime;
use agent::{AgentDeps, ApprovalHandler, ApprovalRequest, SvAgent};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use clap::Args;
use console::style;
use dialoguer::{Confirm, Password};
use llm::LlmClient;
use memory::Collection;
use std::io::{self, Write};
use std::sync::Arc;
use tools::SmsGateway;
use tracing::{debug, info, warn};

/// Chat with the assistant as a given user
#[derive(Debug, Args)]
pub struct ChatCommand {
    /// User id to log in as
    #[arg(short, long)]
    user: String,

    /// Password; prompted for when omitted
    #[arg(short, long)]
    password: Option<String>,

    /// Send a single message instead of starting an interactive session
    #[arg(short, long)]
    message: Option<String>,

    /// Ask on the terminal before running supervised resident actions
    #[arg(long)]
    approve_interactively: bool,
}

/// Asks the operator to stand in for the supervising role.
struct TerminalApproval {
    spinner: ActiveSpinner,
}

#[async_trait]
impl ApprovalHandler for TerminalApproval {
    async fn approve(&self, request: &ApprovalRequest) -> bool {
        let prompt = format!(
            "{} wants to run '{}' with {}. Approve as {}?",
            request.user_id, request.action, request.arguments, request.requires_role
        );
        let spinner = self.spinner.clone();
        let answer = tokio::task::spawn_blocking(move || {
            spinner.suspend(|| Confirm::new().with_prompt(prompt).default(false).interact())
        })
        .await;

        match answer {
            Ok(Ok(approved)) => approved,
            Ok(Err(e)) => {
                warn!("Approval prompt failed: {}", e);
                false
            }
            Err(e) => {
                warn!("Approval prompt panicked: {}", e);
                false
            }
        }
    }
}

impl ChatCommand {
    pub async fn execute(self, runtime: Runtime) -> Result<()> {
        let password = match self.password {
            Some(password) => password,
            None => Password::new().with_prompt("Password").interact()?,
        };

        let user = runtime
            .db
            .authenticate_user(&self.user, &password)
            .await?
            .ok_or_else(|| anyhow!("Invalid credentials for user {}", self.user))?;

        let model = match LlmClient::from_config(&runtime.config.llm) {
            Ok(client) => client,
            Err(e) => {
                eprintln!("{} {}", style("Error:").red().bold(), style(&e).red());
                eprintln!(
                    "{} Set OPENAI_API_KEY in the environment or in a .env file.",
                    style("[i]").yellow().bold()
                );
                return Err(e.into());
            }
        };

        prepare_knowledge(&runtime).await;

        let spinner = ActiveSpinner::default();
        let mut deps = AgentDeps::new(runtime.db.clone(), Arc::new(model), runtime.chat_logger.clone())
            .with_docs(runtime.docs.clone())
            .with_sms(SmsGateway::from_config(&runtime.config.sms))
            .with_settings(runtime.config.agent.clone());
        if self.approve_interactively {
            deps = deps.with_approval(Arc::new(TerminalApproval {
                spinner: spinner.clone(),
            }));
        }

        let mut agent = SvAgent::new(&user.user_id, deps).await?;
        debug!("{}", agent.warm_vector_cache().await);

        match self.message {
            Some(message) => {
                let response = ask(&mut agent, &spinner, &message).await;
                println!("{}", response);
            }
            None => run_interactive(&mut agent, &spinner).await?,
        }
        Ok(())
    }
}

/// Sample documentation and operational data must be searchable before the
/// first turn. Failures only cost context, so they are logged.
async fn prepare_knowledge(runtime: &Runtime) {
    match runtime.docs.prepare().await {
        Ok(0) => {}
        Ok(indexed) => info!(indexed, "Indexed SV documentation"),
        Err(e) => warn!("Documentation unavailable: {}", e),
    }

    if runtime.store.count(Collection::Timetables).await == 0 {
        match runtime.db.refresh_vector_cache().await {
            Ok(true) => info!("Vector cache populated"),
            Ok(false) => debug!("Vector cache not populated"),
            Err(e) => warn!("Vector cache refresh failed: {}", e),
        }
    }
}

async fn ask(agent: &mut SvAgent, spinner: &ActiveSpinner, message: &str) -> String {
    spinner.start("Thinking...");
    let response = agent.chat(message).await;
    spinner.stop();
    response
}

async fn run_interactive(agent: &mut SvAgent, spinner: &ActiveSpinner) -> Result<()> {
    let user = agent.user();
    println!(
        "{} {} ({}) at {}",
        style("SportzVillage Assistant").cyan().bold(),
        style(&user.name).bold(),
        user.role.display_name(),
        user.school_label()
    );
    println!(
        "{}",
        style("Type 'exit' to quit, /clear to reset the conversation, /history or /analytics.").dim()
    );
    println!();

    loop {
        print!("{} ", style("You:").green().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        match input {
            "" => continue,
            "exit" | "quit" => break,
            "/clear" => {
                let forgotten = agent.history_len();
                agent.clear_memory();
                println!(
                    "{}",
                    style(format!("Conversation cleared ({} messages).", forgotten)).dim()
                );
            }
            "/history" => {
                for interaction in agent.get_chat_history(5).await {
                    println!(
                        "{} {}\n  {}",
                        style(&interaction.timestamp).dim(),
                        interaction.interaction.message,
                        interaction.interaction.response.replace('\n', "\n  ")
                    );
                }
            }
            "/analytics" => {
                let analytics = agent.get_session_analytics().await;
                println!("{}", serde_json::to_string_pretty(&analytics)?);
            }
            message => {
                let response = ask(agent, spinner, message).await;
                println!("{} {}\n", style("SV:").cyan().bold(), response);
            }
        }
    }

    println!("{}", style("Goodbye!").cyan());
    Ok(())
}
