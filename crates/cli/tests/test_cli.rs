use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A data directory with a users table and nothing else.
fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let tables = dir.path().join("txt_tables");
    std::fs::create_dir_all(&tables).unwrap();
    std::fs::write(
        tables.join("users.txt"),
        "user_id|password|role|name|school_id|reports_to\n\
         R001|r123|R|Ravi Kumar|SCH001|DM001\n",
    )
    .unwrap();
    dir
}

fn sv(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sv-assistant").unwrap();
    cmd.current_dir(dir.path())
        .env("SV_DATA_DIR", dir.path())
        .env_remove("OPENAI_API_KEY")
        .env_remove("EMBEDDING_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = data_dir();
    sv(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("vectordb"))
        .stdout(predicate::str::contains("docs"));
}

#[test]
fn test_docs_init_index_and_search() {
    let dir = data_dir();
    sv(&dir)
        .args(["docs", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));
    assert!(dir.path().join("sv_docs").is_dir());

    sv(&dir)
        .args(["docs", "index"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexed"));

    sv(&dir)
        .args(["docs", "search", "lesson completion", "--doc-type", "processes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--- SV Documentation:"));

    sv(&dir)
        .args(["docs", "search", "anything", "--doc-type", "recipes"])
        .assert()
        .failure();
}

#[test]
fn test_vectordb_stats_and_reset() {
    let dir = data_dir();
    sv(&dir)
        .args(["vectordb", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("timetables"))
        .stdout(predicate::str::contains("user_context"));

    sv(&dir)
        .args(["vectordb", "reset", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Vector store reset"));
}

#[test]
fn test_chat_rejects_unknown_user() {
    let dir = data_dir();
    sv(&dir)
        .args(["chat", "--user", "X999", "--password", "x", "--message", "hi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid credentials for user X999"));
}

#[test]
fn test_chat_requires_api_key() {
    let dir = data_dir();
    sv(&dir)
        .args(["chat", "--user", "R001", "--password", "r123", "--message", "hi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn test_chat_prepares_documentation_on_first_run() {
    let dir = data_dir();
    let mut server = mockito::Server::new();
    let llm = server
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::Regex(
            "SV OFFICIAL DOCUMENTATION CONTEXT:.*--- SV Documentation: ".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"choices":[{"message":{"role":"assistant","content":"Log the lesson, then send the SV SMS."}}]}"#,
        )
        .expect(1)
        .create();

    sv(&dir)
        .env("OPENAI_API_KEY", "sk-test")
        .env("OPENAI_BASE_URL", server.url())
        .args([
            "chat",
            "--user",
            "R001",
            "--password",
            "r123",
            "--message",
            "What is the lesson completion process and SMS format?",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Log the lesson, then send the SV SMS."));

    llm.assert();
    assert!(dir
        .path()
        .join("sv_docs/processes/lesson_completion_guide.md")
        .exists());
}

#[test]
fn test_history_and_analytics_when_empty() {
    let dir = data_dir();
    sv(&dir)
        .args(["history", "--user", "R001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No chat history for R001"));

    sv(&dir)
        .arg("analytics")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total interactions"));
}

#[test]
fn test_invalid_config_value_fails() {
    let dir = data_dir();
    sv(&dir)
        .env("AGENT_MAX_ITERATIONS", "many")
        .args(["vectordb", "stats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AGENT_MAX_ITERATIONS"));
}
