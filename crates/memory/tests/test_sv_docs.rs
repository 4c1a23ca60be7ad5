use memory::{DocType, HashingEmbedder, SvDocumentManager, VectorStore};
use std::sync::Arc;
use tempfile::TempDir;

async fn manager(dir: &TempDir) -> SvDocumentManager {
    let store = VectorStore::open(dir.path().join("vectors"), Arc::new(HashingEmbedder::new(256)))
        .await
        .unwrap();
    SvDocumentManager::new(dir.path().join("sv_docs"), Arc::new(store))
}

#[tokio::test]
async fn test_ensure_ready_creates_and_indexes_samples() {
    let dir = TempDir::new().unwrap();
    let docs = manager(&dir).await;

    let indexed = docs.ensure_ready().await.unwrap();
    assert_eq!(indexed, 4);
    assert!(dir
        .path()
        .join("sv_docs/processes/lesson_completion_guide.md")
        .exists());

    let listed = docs.list_documents().await.unwrap();
    assert_eq!(listed.len(), 4);
    assert_eq!(listed[0].0, DocType::Processes);
}

#[tokio::test]
async fn test_relevant_documentation_blocks() {
    let dir = TempDir::new().unwrap();
    let docs = manager(&dir).await;
    docs.ensure_ready().await.unwrap();

    let context = docs
        .get_relevant_documentation("lesson completion SMS format", Some(DocType::Processes), 3)
        .await;
    assert!(context.contains("--- SV Documentation: Lesson Completion Guide (processes) ---"));
    assert!(!context.contains("(policies)"));

    let none = docs
        .get_relevant_documentation("anything", Some(DocType::Guidelines), 3)
        .await;
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_root_markdown_is_general() {
    let dir = TempDir::new().unwrap();
    let docs = manager(&dir).await;
    docs.create_sample_documentation().await.unwrap();
    tokio::fs::write(
        dir.path().join("sv_docs/holiday_calendar.md"),
        "# Holiday Calendar\n\nNo PE sessions during exam week.",
    )
    .await
    .unwrap();

    assert_eq!(docs.index_sv_documentation().await.unwrap(), 5);
    let context = docs
        .get_relevant_documentation("holiday calendar exam week", Some(DocType::General), 1)
        .await;
    assert!(context.starts_with("--- SV Documentation: Holiday Calendar (general) ---"));
}

#[tokio::test]
async fn test_prepare_indexes_once() {
    let dir = TempDir::new().unwrap();
    let docs = manager(&dir).await;

    assert_eq!(docs.prepare().await.unwrap(), 4);
    assert!(dir.path().join("sv_docs/policies/quality_standards.md").exists());

    // Second start finds the collection populated.
    assert_eq!(docs.prepare().await.unwrap(), 0);
    let context = docs
        .get_relevant_documentation("prop damaged", None, 2)
        .await;
    assert!(context.contains("--- SV Documentation:"));
}
