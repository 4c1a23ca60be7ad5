//! Official SportzVillage documentation (SOPs, templates, policies) indexed
//! for retrieval alongside operational data.

use crate::store::{Collection, VectorStore};
use crate::vector_index::Metadata;
use common::VectorStoreError;
use domain::title_case;
use serde_json::json;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const SAMPLE_DOCS: [(&str, &str); 4] = [
    (
        "processes/lesson_completion_guide.md",
        include_str!("../assets/sv_docs/processes/lesson_completion_guide.md"),
    ),
    (
        "processes/prop_management_sop.md",
        include_str!("../assets/sv_docs/processes/prop_management_sop.md"),
    ),
    (
        "templates/weekly_report_format.md",
        include_str!("../assets/sv_docs/templates/weekly_report_format.md"),
    ),
    (
        "policies/quality_standards.md",
        include_str!("../assets/sv_docs/policies/quality_standards.md"),
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocType {
    Processes,
    Templates,
    Policies,
    Guidelines,
    /// Markdown files at the root of the docs directory
    General,
}

impl DocType {
    pub const CATEGORIZED: [DocType; 4] = [
        DocType::Processes,
        DocType::Templates,
        DocType::Policies,
        DocType::Guidelines,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Processes => "processes",
            DocType::Templates => "templates",
            DocType::Policies => "policies",
            DocType::Guidelines => "guidelines",
            DocType::General => "general",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DocType::Processes => "Standard Operating Procedures",
            DocType::Templates => "Report and Communication Templates",
            DocType::Policies => "Quality Standards and Policies",
            DocType::Guidelines => "Best Practices and Guidelines",
            DocType::General => "General Documentation",
        }
    }
}

impl FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "processes" | "process" => Ok(DocType::Processes),
            "templates" | "template" => Ok(DocType::Templates),
            "policies" | "policy" => Ok(DocType::Policies),
            "guidelines" | "guideline" => Ok(DocType::Guidelines),
            "general" => Ok(DocType::General),
            other => Err(format!("unknown documentation type: {}", other)),
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct SvDocumentManager {
    docs_dir: PathBuf,
    store: Arc<VectorStore>,
}

impl SvDocumentManager {
    pub fn new(docs_dir: impl Into<PathBuf>, store: Arc<VectorStore>) -> Self {
        Self {
            docs_dir: docs_dir.into(),
            store,
        }
    }

    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    /// Write the bundled SV documents into the docs directory.
    pub async fn create_sample_documentation(&self) -> Result<usize, VectorStoreError> {
        for (relative, content) in SAMPLE_DOCS {
            let path = self.docs_dir.join(relative);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, content).await?;
        }
        info!("Created {} sample SV documentation files", SAMPLE_DOCS.len());
        Ok(SAMPLE_DOCS.len())
    }

    /// Every markdown document on disk with its type, sorted by path.
    pub async fn list_documents(&self) -> Result<Vec<(DocType, PathBuf)>, VectorStoreError> {
        let mut documents = Vec::new();
        for doc_type in DocType::CATEGORIZED {
            let dir = self.docs_dir.join(doc_type.as_str());
            for path in markdown_files(&dir).await? {
                documents.push((doc_type, path));
            }
        }
        for path in markdown_files(&self.docs_dir).await? {
            documents.push((DocType::General, path));
        }
        Ok(documents)
    }

    /// Index every document; unreadable files are logged and skipped.
    pub async fn index_sv_documentation(&self) -> Result<usize, VectorStoreError> {
        info!("Starting SV documentation indexing...");
        let mut indexed = 0;

        for (doc_type, path) in self.list_documents().await? {
            match self.index_document(&path, doc_type).await {
                Ok(()) => indexed += 1,
                Err(e) => error!("Error indexing {}: {}", path.display(), e),
            }
        }

        info!(indexed, "SV documentation indexing completed");
        Ok(indexed)
    }

    async fn index_document(&self, path: &Path, doc_type: DocType) -> Result<(), VectorStoreError> {
        let content = tokio::fs::read_to_string(path).await?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let title = title_case(&stem.replace('_', " "));
        let filename = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut metadata = Metadata::new();
        metadata.insert("title".into(), json!(title));
        metadata.insert("filename".into(), json!(filename));
        metadata.insert("doc_type".into(), json!(doc_type.as_str()));
        metadata.insert("category".into(), json!("sv_documentation"));
        metadata.insert("source".into(), json!("official_sv_docs"));

        let doc_id = format!("sv_doc_{}_{}", doc_type.as_str(), stem);
        self.store.store_document(&doc_id, &content, metadata).await?;
        info!("Indexed document: {}", title);
        Ok(())
    }

    /// Up to `max_docs` documentation chunks relevant to `query`, formatted
    /// as labelled blocks. Empty when nothing matches or retrieval fails.
    pub async fn get_relevant_documentation(
        &self,
        query: &str,
        doc_type: Option<DocType>,
        max_docs: usize,
    ) -> String {
        let mut filter = Metadata::new();
        filter.insert("category".into(), json!("sv_documentation"));
        if let Some(doc_type) = doc_type {
            filter.insert("doc_type".into(), json!(doc_type.as_str()));
        }

        let hits = match self.store.search_documents(query, max_docs, Some(&filter)).await {
            Ok(hits) => hits,
            Err(e) => {
                error!("Error retrieving documentation: {}", e);
                return String::new();
            }
        };

        hits.iter()
            .map(|hit| {
                let title = hit
                    .metadata
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Unknown Document");
                let doc_type = hit
                    .metadata
                    .get("doc_type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("general");
                format!(
                    "--- SV Documentation: {} ({}) ---\n{}",
                    title, doc_type, hit.document
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Create the sample set when the directory is missing, then index and
    /// persist.
    pub async fn ensure_ready(&self) -> Result<usize, VectorStoreError> {
        self.ensure_docs_on_disk().await?;
        let indexed = self.index_sv_documentation().await?;
        self.store.persist().await?;
        Ok(indexed)
    }

    /// Like `ensure_ready`, but leaves an already indexed store alone.
    /// Returns the number of documents indexed by this call.
    pub async fn prepare(&self) -> Result<usize, VectorStoreError> {
        self.ensure_docs_on_disk().await?;
        if self.store.count(Collection::Documents).await > 0 {
            debug!("SV documentation already indexed");
            return Ok(0);
        }
        let indexed = self.index_sv_documentation().await?;
        self.store.persist().await?;
        Ok(indexed)
    }

    async fn ensure_docs_on_disk(&self) -> Result<(), VectorStoreError> {
        if !self.docs_dir.exists() {
            warn!(dir = %self.docs_dir.display(), "Documentation directory missing, creating samples");
            self.create_sample_documentation().await?;
        }
        Ok(())
    }
}

async fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, VectorStoreError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_type_parse() {
        assert_eq!("Processes".parse::<DocType>().unwrap(), DocType::Processes);
        assert_eq!("policy".parse::<DocType>().unwrap(), DocType::Policies);
        assert!("memos".parse::<DocType>().is_err());
    }

    #[test]
    fn test_sample_docs_bundled() {
        assert!(SAMPLE_DOCS
            .iter()
            .any(|(path, content)| path.starts_with("processes/") && content.contains("[SV-LC]")));
    }
}
