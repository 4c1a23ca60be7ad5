use crate::runtime::Runtime;
use anyhow::Result;
use clap::Args;
use console::style;

/// Show a user's recent interactions
#[derive(Debug, Args)]
pub struct HistoryCommand {
    #[arg(short, long)]
    user: String,

    #[arg(short, long, default_value = "10")]
    limit: usize,
}

impl HistoryCommand {
    pub async fn execute(self, runtime: Runtime) -> Result<()> {
        let history = runtime
            .chat_logger
            .get_user_chat_history(&self.user, self.limit)
            .await;
        if history.is_empty() {
            println!("No chat history for {}", self.user);
            return Ok(());
        }

        for entry in history {
            println!(
                "{} {} [{}]",
                style(&entry.timestamp).dim(),
                style(&entry.session_id).cyan(),
                entry.interaction.tools_used.join(", ")
            );
            println!("  {} {}", style("Q:").green().bold(), entry.interaction.message);
            println!(
                "  {} {}",
                style("A:").cyan().bold(),
                entry.interaction.response.replace('\n', "\n     ")
            );
            println!();
        }
        Ok(())
    }
}

/// Print aggregate usage over every logged interaction.
pub async fn show_analytics(runtime: Runtime) -> Result<()> {
    let analytics = runtime.chat_logger.get_analytics().await;
    println!("{}", style("=== Chat Analytics ===").bold().blue());
    println!("{}: {}", style("Total interactions").cyan(), analytics.total_interactions);

    let Some(summary) = analytics.summary else {
        return Ok(());
    };
    println!("{}: {}", style("Unique users").cyan(), summary.unique_users);
    println!(
        "{}: {} to {}",
        style("Period").cyan(),
        summary.date_range.earliest,
        summary.date_range.latest
    );

    for (title, counts) in [
        ("Message types", &summary.message_types),
        ("Roles", &summary.roles),
        ("Schools", &summary.schools),
    ] {
        println!("\n{}", style(title).bold());
        for (key, count) in counts {
            println!("  {:<20} {}", key, count);
        }
    }

    let llm = &summary.llm_analytics;
    println!("\n{}", style("LLM usage").bold());
    println!("  {:<20} {}", "Prompt tokens", llm.total_prompt_tokens);
    println!("  {:<20} {}", "Completion tokens", llm.total_completion_tokens);
    println!("  {:<20} {}", "Total tokens", llm.total_tokens_used);
    println!("  {:<20} {:.1}", "Tokens/interaction", llm.tokens_per_interaction);
    println!("  {:<20} ${:.4}", "GPT-4 estimate", llm.estimated_costs.gpt4_estimate);
    println!("  {:<20} ${:.4}", "GPT-3.5 estimate", llm.estimated_costs.gpt35_estimate);
    Ok(())
}
