//! Audit trail of every assistant interaction.
//!
//! Each interaction lands in two files under the log directory:
//! `chat_logs.csv` for spreadsheets and `chat_sessions.json` for analysis.

use chrono::Local;
use common::DatabaseError;
use domain::User;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info};

const CSV_FILE: &str = "chat_logs.csv";
const JSON_FILE: &str = "chat_sessions.json";

const CSV_HEADER: [&str; 16] = [
    "timestamp",
    "session_id",
    "user_id",
    "username",
    "role",
    "school_id",
    "message",
    "response",
    "tools_used",
    "response_time",
    "llm_prompt",
    "prompt_tokens",
    "completion_tokens",
    "total_tokens",
    "model_used",
    "temperature",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatUser {
    pub user_id: String,
    pub name: String,
    pub role: String,
    pub school_id: Option<String>,
}

impl From<&User> for ChatUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            name: user.name.clone(),
            role: user.role.as_str().to_string(),
            school_id: user.school_id.clone(),
        }
    }
}

/// Model usage attached to one interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmLogData {
    pub llm_prompt: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub model_used: String,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionDetails {
    pub message: String,
    pub message_length: usize,
    pub response: String,
    pub response_length: usize,
    pub tools_used: Vec<String>,
    pub response_time_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionMetadata {
    pub message_type: String,
    pub contains_school_data: bool,
    pub contains_resident_data: bool,
    pub is_question: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatInteraction {
    pub timestamp: String,
    pub session_id: String,
    pub user: ChatUser,
    pub interaction: InteractionDetails,
    #[serde(default)]
    pub llm_analytics: LlmLogData,
    pub metadata: InteractionMetadata,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionsFile {
    #[serde(default)]
    interactions: Vec<ChatInteraction>,
}

/// Aggregate view over the JSON log. Only `total_interactions` is present
/// when nothing has been logged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatAnalytics {
    pub total_interactions: usize,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub summary: Option<AnalyticsSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub unique_users: usize,
    pub message_types: BTreeMap<String, usize>,
    pub roles: BTreeMap<String, usize>,
    pub schools: BTreeMap<String, usize>,
    pub llm_analytics: LlmUsageTotals,
    pub date_range: TimestampSpan,
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmUsageTotals {
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_tokens_used: u64,
    pub models_used: BTreeMap<String, usize>,
    pub average_temperature: f64,
    pub estimated_costs: CostEstimates,
    pub tokens_per_interaction: f64,
}

/// USD, at list prices per 1K tokens.
#[derive(Debug, Clone, Serialize)]
pub struct CostEstimates {
    pub gpt4_estimate: f64,
    pub gpt35_estimate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimestampSpan {
    pub earliest: String,
    pub latest: String,
}

pub struct ChatLogger {
    log_dir: PathBuf,
    csv_file: PathBuf,
    json_file: PathBuf,
    write_lock: Mutex<()>,
}

impl ChatLogger {
    /// Create the log directory and the CSV header if needed.
    pub async fn open(log_dir: impl Into<PathBuf>) -> Result<Self, DatabaseError> {
        let log_dir = log_dir.into();
        let write_err = |source| DatabaseError::TableWrite {
            table: CSV_FILE.to_string(),
            source,
        };

        tokio::fs::create_dir_all(&log_dir).await.map_err(write_err)?;
        let csv_file = log_dir.join(CSV_FILE);
        if !csv_file.exists() {
            let header: Vec<String> = CSV_HEADER.iter().map(|h| h.to_string()).collect();
            tokio::fs::write(&csv_file, csv_row(&header))
                .await
                .map_err(write_err)?;
        }

        Ok(Self {
            json_file: log_dir.join(JSON_FILE),
            csv_file,
            log_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Record one interaction and return the session id it was filed under.
    #[allow(clippy::too_many_arguments)]
    pub async fn log_interaction(
        &self,
        user: &ChatUser,
        message: &str,
        response: &str,
        tools_used: &[String],
        response_time: Option<f64>,
        session_id: Option<&str>,
        llm_data: Option<LlmLogData>,
    ) -> Result<String, DatabaseError> {
        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        let session_id = session_id
            .map(String::from)
            .unwrap_or_else(generate_session_id);
        let llm = llm_data.unwrap_or_default();

        let _guard = self.write_lock.lock().await;

        let row = csv_row(&[
            timestamp.clone(),
            session_id.clone(),
            user.user_id.clone(),
            user.name.clone(),
            user.role.clone(),
            user.school_id.clone().unwrap_or_default(),
            message.to_string(),
            response.to_string(),
            serde_json::to_string(tools_used).unwrap_or_else(|_| "[]".to_string()),
            response_time.unwrap_or(0.0).to_string(),
            llm.llm_prompt.clone(),
            llm.prompt_tokens.to_string(),
            llm.completion_tokens.to_string(),
            llm.total_tokens.to_string(),
            llm.model_used.clone(),
            llm.temperature.to_string(),
        ]);
        self.append_csv(&row).await?;

        let interaction = ChatInteraction {
            timestamp,
            session_id: session_id.clone(),
            user: user.clone(),
            interaction: InteractionDetails {
                message: message.to_string(),
                message_length: message.chars().count(),
                response: response.to_string(),
                response_length: response.chars().count(),
                tools_used: tools_used.to_vec(),
                response_time_seconds: response_time,
            },
            llm_analytics: llm,
            metadata: InteractionMetadata {
                message_type: classify_message(message).to_string(),
                contains_school_data: message.to_lowercase().contains("school"),
                contains_resident_data: message.to_lowercase().contains("resident"),
                is_question: message.trim().ends_with('?'),
            },
        };
        if let Err(e) = self.append_json(interaction).await {
            error!("Failed to log to JSON: {}", e);
        }

        info!(
            user_id = %user.user_id,
            chars = message.chars().count(),
            "Chat interaction logged"
        );
        Ok(session_id)
    }

    async fn append_csv(&self, row: &str) -> Result<(), DatabaseError> {
        let write_err = |source| DatabaseError::TableWrite {
            table: CSV_FILE.to_string(),
            source,
        };
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.csv_file)
            .await
            .map_err(write_err)?;
        file.write_all(row.as_bytes()).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)
    }

    async fn append_json(&self, interaction: ChatInteraction) -> Result<(), DatabaseError> {
        let mut data = self.load_sessions().await?;
        data.interactions.push(interaction);

        let raw = serde_json::to_string_pretty(&data).map_err(|e| DatabaseError::InvalidRecord {
            table: JSON_FILE.to_string(),
            message: e.to_string(),
        })?;
        let write_err = |source| DatabaseError::TableWrite {
            table: JSON_FILE.to_string(),
            source,
        };
        // Replace the file in one step so a failed write leaves the old log.
        let tmp = self.json_file.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, &self.json_file)
            .await
            .map_err(write_err)
    }

    async fn load_sessions(&self) -> Result<SessionsFile, DatabaseError> {
        if !self.json_file.exists() {
            return Ok(SessionsFile::default());
        }
        let raw = tokio::fs::read_to_string(&self.json_file)
            .await
            .map_err(|source| DatabaseError::TableRead {
                table: JSON_FILE.to_string(),
                source,
            })?;
        serde_json::from_str(&raw).map_err(|e| DatabaseError::InvalidRecord {
            table: JSON_FILE.to_string(),
            message: e.to_string(),
        })
    }

    async fn interactions(&self) -> Vec<ChatInteraction> {
        match self.load_sessions().await {
            Ok(data) => data.interactions,
            Err(e) => {
                error!("Failed to read chat logs: {}", e);
                Vec::new()
            }
        }
    }

    /// Newest first, at most `limit` entries.
    pub async fn get_user_chat_history(&self, user_id: &str, limit: usize) -> Vec<ChatInteraction> {
        let mut history: Vec<ChatInteraction> = self
            .interactions()
            .await
            .into_iter()
            .filter(|i| i.user.user_id == user_id)
            .collect();
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        history.truncate(limit);
        history
    }

    /// Interactions whose ISO timestamp lies within the given bounds
    /// (string comparison, both inclusive).
    pub async fn get_all_chat_logs(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Vec<ChatInteraction> {
        self.interactions()
            .await
            .into_iter()
            .filter(|i| start.map_or(true, |s| i.timestamp.as_str() >= s))
            .filter(|i| end.map_or(true, |e| i.timestamp.as_str() <= e))
            .collect()
    }

    pub async fn get_analytics(&self) -> ChatAnalytics {
        summarize(&self.get_all_chat_logs(None, None).await)
    }
}

fn summarize(logs: &[ChatInteraction]) -> ChatAnalytics {
    let (Some(earliest), Some(latest)) = (
        logs.iter().map(|l| &l.timestamp).min(),
        logs.iter().map(|l| &l.timestamp).max(),
    ) else {
        return ChatAnalytics::default();
    };

    let mut message_types = BTreeMap::new();
    let mut roles = BTreeMap::new();
    let mut schools = BTreeMap::new();
    let mut models_used = BTreeMap::new();
    let mut temperatures = Vec::new();
    let (mut prompt_tokens, mut completion_tokens, mut total_tokens) = (0u64, 0u64, 0u64);

    for log in logs {
        *message_types
            .entry(log.metadata.message_type.clone())
            .or_insert(0) += 1;
        *roles.entry(log.user.role.clone()).or_insert(0) += 1;
        if let Some(school) = log.user.school_id.as_ref().filter(|s| !s.is_empty()) {
            *schools.entry(school.clone()).or_insert(0) += 1;
        }

        let llm = &log.llm_analytics;
        prompt_tokens += llm.prompt_tokens;
        completion_tokens += llm.completion_tokens;
        total_tokens += llm.total_tokens;
        if !llm.model_used.is_empty() {
            *models_used.entry(llm.model_used.clone()).or_insert(0) += 1;
        }
        if llm.temperature > 0.0 {
            temperatures.push(llm.temperature);
        }
    }

    let average_temperature = if temperatures.is_empty() {
        0.0
    } else {
        temperatures.iter().sum::<f64>() / temperatures.len() as f64
    };
    let (prompt, completion) = (prompt_tokens as f64, completion_tokens as f64);
    let unique_users: HashSet<&str> = logs.iter().map(|l| l.user.user_id.as_str()).collect();

    ChatAnalytics {
        total_interactions: logs.len(),
        summary: Some(AnalyticsSummary {
            unique_users: unique_users.len(),
            message_types,
            roles,
            schools,
            llm_analytics: LlmUsageTotals {
                total_prompt_tokens: prompt_tokens,
                total_completion_tokens: completion_tokens,
                total_tokens_used: total_tokens,
                models_used,
                average_temperature: round_to(average_temperature, 2),
                estimated_costs: CostEstimates {
                    gpt4_estimate: round_to(prompt * 0.03 / 1000.0 + completion * 0.06 / 1000.0, 4),
                    gpt35_estimate: round_to(
                        prompt * 0.0015 / 1000.0 + completion * 0.002 / 1000.0,
                        4,
                    ),
                },
                tokens_per_interaction: round_to(total_tokens as f64 / logs.len() as f64, 1),
            },
            date_range: TimestampSpan {
                earliest: earliest.clone(),
                latest: latest.clone(),
            },
        }),
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// First matching category wins.
pub fn classify_message(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has_any(&["report", "generate", "show me"]) {
        "request"
    } else if lower.trim().ends_with('?') {
        "question"
    } else if has_any(&["update", "log", "complete"]) {
        "action"
    } else if has_any(&["help", "how", "what"]) {
        "help"
    } else {
        "general"
    }
}

/// `session_YYYYMMDD_HHMMSS` in local time.
pub fn generate_session_id() -> String {
    format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

/// One RFC 4180 record, CRLF terminated.
fn csv_row(fields: &[String]) -> String {
    let mut row = fields
        .iter()
        .map(|field| {
            if field.contains([',', '"', '\n', '\r']) {
                format!("\"{}\"", field.replace('"', "\"\""))
            } else {
                field.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_message_precedence() {
        assert_eq!(classify_message("Generate the weekly report?"), "request");
        assert_eq!(classify_message("Show me the props"), "request");
        assert_eq!(classify_message("Did I log period 2?"), "question");
        assert_eq!(classify_message("Update prop P001 to damaged"), "action");
        assert_eq!(classify_message("how does this work"), "help");
        assert_eq!(classify_message("good morning"), "general");
    }

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        assert!(id.starts_with("session_"));
        assert_eq!(id.len(), "session_20240101_093000".len());
        assert_eq!(&id[16..17], "_");
    }

    #[test]
    fn test_csv_quoting() {
        let row = csv_row(&[
            "plain".to_string(),
            "a,b".to_string(),
            "say \"hi\"".to_string(),
            "two\nlines".to_string(),
        ]);
        assert_eq!(row, "plain,\"a,b\",\"say \"\"hi\"\"\",\"two\nlines\"\r\n");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(33.333, 1), 33.3);
    }

    #[test]
    fn test_empty_analytics_only_has_total() {
        let analytics = summarize(&[]);
        let json = serde_json::to_value(&analytics).unwrap();
        assert_eq!(json, serde_json::json!({"total_interactions": 0}));
    }
}
