use crate::progress::spinner;
use crate::runtime::Runtime;
use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use console::style;
use dialoguer::Confirm;
use memory::{Collection, ContextType, SearchHit};

const SEARCH_RESULTS: usize = 5;

/// Manage the vector store
#[derive(Debug, Args)]
pub struct VectorDbCommand {
    #[command(subcommand)]
    command: VectorDbSubcommand,
}

#[derive(Debug, Clone, Subcommand)]
enum VectorDbSubcommand {
    /// Index timetables, lessons, props and documentation
    Populate,

    /// Delete every stored vector
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show document counts per collection
    Stats,

    /// Search the store
    Search {
        query: String,

        /// Restrict to one collection (timetables, lessons, props, documents, user_context)
        #[arg(short, long)]
        collection: Option<String>,
    },
}

impl VectorDbCommand {
    pub async fn execute(self, runtime: Runtime) -> Result<()> {
        match self.command {
            VectorDbSubcommand::Populate => populate(&runtime).await,
            VectorDbSubcommand::Reset { yes } => reset(&runtime, yes).await,
            VectorDbSubcommand::Stats => stats(&runtime).await,
            VectorDbSubcommand::Search { query, collection } => {
                search(&runtime, &query, collection.as_deref()).await
            }
        }
    }
}

async fn populate(runtime: &Runtime) -> Result<()> {
    let progress = spinner("Indexing operational data...");
    let refreshed = runtime.db.refresh_vector_cache().await?;
    progress.set_message("Indexing SV documentation...");
    let documents = runtime.docs.ensure_ready().await?;
    progress.finish_and_clear();

    if !refreshed {
        bail!("Vector cache refresh failed");
    }
    println!(
        "{} Indexed operational data and {} documentation files",
        style("[✓]").green().bold(),
        documents
    );
    stats(runtime).await
}

async fn reset(runtime: &Runtime, yes: bool) -> Result<()> {
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Delete every document in the vector store?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted");
            return Ok(());
        }
    }
    runtime.store.reset().await?;
    println!("{} Vector store reset", style("[✓]").green().bold());
    Ok(())
}

async fn stats(runtime: &Runtime) -> Result<()> {
    let stats = runtime.store.stats().await;
    println!("{}", style("=== Vector Store ===").bold().blue());
    println!("{}: {}", style("Location").cyan(), stats.persist_dir.display());
    println!("{}: {}", style("Embedder").cyan(), stats.embedder);
    for (name, count) in &stats.collections {
        println!("  {:<14} {}", name, count);
    }
    println!("{}: {}", style("Total documents").cyan(), stats.total_documents());
    Ok(())
}

async fn search(runtime: &Runtime, query: &str, collection: Option<&str>) -> Result<()> {
    let hits = match collection {
        Some(name) => {
            let collection: Collection = name.parse()?;
            runtime
                .store
                .query(collection, query, SEARCH_RESULTS, None)
                .await?
        }
        None => {
            runtime
                .store
                .search_in(query, ContextType::All, None, SEARCH_RESULTS)
                .await?
        }
    };

    if hits.is_empty() {
        println!("No results found for '{}'", query);
        return Ok(());
    }
    for hit in &hits {
        print_hit(hit);
    }
    Ok(())
}

fn print_hit(hit: &SearchHit) {
    let preview: String = hit.document.chars().take(200).collect();
    println!(
        "{} {} {}",
        style(format!("[{:.3}]", hit.score)).yellow(),
        style(hit.collection).cyan(),
        style(&hit.id).dim()
    );
    println!("  {}\n", preview.replace('\n', "\n  "));
}
