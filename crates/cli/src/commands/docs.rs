use crate::runtime::Runtime;
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use console::style;
use memory::DocType;

/// Manage the SV documentation set
#[derive(Debug, Args)]
pub struct DocsCommand {
    #[command(subcommand)]
    command: DocsSubcommand,
}

#[derive(Debug, Clone, Subcommand)]
enum DocsSubcommand {
    /// Write the bundled sample documentation into the docs directory
    Init,

    /// Index every document under the docs directory
    Index,

    /// Search the indexed documentation
    Search {
        query: String,

        /// processes, templates, policies or guidelines
        #[arg(short, long)]
        doc_type: Option<String>,
    },
}

impl DocsCommand {
    pub async fn execute(self, runtime: Runtime) -> Result<()> {
        let docs = &runtime.docs;
        match self.command {
            DocsSubcommand::Init => {
                let created = docs.create_sample_documentation().await?;
                println!(
                    "{} Created {} documents in {}",
                    style("[✓]").green().bold(),
                    created,
                    docs.docs_dir().display()
                );
            }
            DocsSubcommand::Index => {
                let indexed = docs.index_sv_documentation().await?;
                runtime.store.persist().await?;
                println!("{} Indexed {} documents", style("[✓]").green().bold(), indexed);
            }
            DocsSubcommand::Search { query, doc_type } => {
                let doc_type = doc_type
                    .map(|raw| raw.parse::<DocType>().map_err(|e| anyhow!(e)))
                    .transpose()?;
                let results = docs.get_relevant_documentation(&query, doc_type, 3).await;
                if results.is_empty() {
                    println!("No SV documentation found for '{}'", query);
                } else {
                    println!("{}", results);
                }
            }
        }
        Ok(())
    }
}
