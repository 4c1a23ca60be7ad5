use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "sv-assistant.toml";

/// Application configuration: defaults, then an optional TOML file, then
/// environment variables (a `.env` file is loaded first).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub embeddings: EmbeddingConfig,
    pub sms: SmsConfig,
    pub agent: AgentSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub tables_dir: Option<PathBuf>,
    pub chat_log_dir: Option<PathBuf>,
    pub vector_dir: Option<PathBuf>,
    pub docs_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            tables_dir: None,
            chat_log_dir: None,
            vector_dir: None,
            docs_dir: None,
        }
    }
}

impl PathsConfig {
    /// Rooted at `data_dir`, every sub-directory derived from it.
    pub fn rooted_at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn tables_dir(&self) -> PathBuf {
        self.tables_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("txt_tables"))
    }

    pub fn chat_log_dir(&self) -> PathBuf {
        self.chat_log_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("chat_logs"))
    }

    pub fn vector_dir(&self) -> PathBuf {
        self.vector_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("chromadb"))
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.docs_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("sv_docs"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Text,
    MySql,
}

impl FromStr for DatabaseKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(DatabaseKind::Text),
            "mysql" => Ok(DatabaseKind::MySql),
            other => Err(ConfigError::UnsupportedDatabase(other.to_string())),
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseKind::Text => write!(f, "text"),
            DatabaseKind::MySql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `text` or `mysql`; validated when the database is opened
    pub kind: String,
    pub mysql_host: String,
    pub mysql_port: u16,
    pub mysql_user: String,
    pub mysql_password: String,
    pub mysql_database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: "text".to_string(),
            mysql_host: "localhost".to_string(),
            mysql_port: 3306,
            mysql_user: "root".to_string(),
            mysql_password: String::new(),
            mysql_database: "sportzvillage".to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn kind(&self) -> Result<DatabaseKind, ConfigError> {
        self.kind.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.0,
            max_tokens: 1000,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Falls back to the LLM key when unset
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
    /// Dimension of the offline hashing embedder
    pub local_dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            base_url: None,
            local_dimension: 256,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl SmsConfig {
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub max_iterations: usize,
    pub validate_responses: bool,
    pub history_limit: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            validate_responses: true,
            history_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub debug_mode: bool,
    pub json: bool,
}

impl AppConfig {
    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] when it
    /// exists, then apply process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(p) => Self::from_toml_file(p)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_toml_file(default)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_with(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Apply overrides from a key lookup. Unset keys leave values untouched.
    pub fn apply_env_with<F>(&mut self, get: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get("SV_DATA_DIR") {
            self.paths.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("SV_TABLES_DIR") {
            self.paths.tables_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get("SV_CHAT_LOG_DIR") {
            self.paths.chat_log_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get("CHROMA_PERSIST_DIRECTORY") {
            self.paths.vector_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get("SV_DOCS_DIR") {
            self.paths.docs_dir = Some(PathBuf::from(v));
        }

        if let Some(v) = get("DB_TYPE") {
            self.database.kind = v.trim().to_lowercase();
        }
        if let Some(v) = get("MYSQL_HOST") {
            self.database.mysql_host = v;
        }
        if let Some(v) = get("MYSQL_PORT") {
            self.database.mysql_port = parse_value("MYSQL_PORT", &v)?;
        }
        if let Some(v) = get("MYSQL_USER") {
            self.database.mysql_user = v;
        }
        if let Some(v) = get("MYSQL_PASSWORD") {
            self.database.mysql_password = v;
        }
        if let Some(v) = get("MYSQL_DATABASE") {
            self.database.mysql_database = v;
        }

        if let Some(v) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.llm.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("LLM_TEMPERATURE") {
            self.llm.temperature = parse_value("LLM_TEMPERATURE", &v)?;
        }
        if let Some(v) = get("LLM_MAX_TOKENS") {
            self.llm.max_tokens = parse_value("LLM_MAX_TOKENS", &v)?;
        }

        if let Some(v) = get("EMBEDDING_MODEL") {
            self.embeddings.model = v;
        }
        if let Some(v) = get("EMBEDDING_API_KEY") {
            self.embeddings.api_key = Some(v);
        }

        if let Some(v) = get("SMS_API_ENDPOINT") {
            self.sms.endpoint = Some(v);
        }
        if let Some(v) = get("SMS_API_KEY") {
            self.sms.api_key = Some(v);
        }

        if let Some(v) = get("AGENT_MAX_ITERATIONS") {
            self.agent.max_iterations = parse_value("AGENT_MAX_ITERATIONS", &v)?;
        }
        if let Some(v) = get("SV_VALIDATE_RESPONSES") {
            self.agent.validate_responses = parse_bool("SV_VALIDATE_RESPONSES", &v)?;
        }

        if let Some(v) = get("SV_DEBUG_MODE") {
            self.logging.debug_mode = parse_bool("SV_DEBUG_MODE", &v)?;
        }
        if let Some(v) = get("SV_LOG_JSON") {
            self.logging.json = parse_bool("SV_LOG_JSON", &v)?;
        }

        Ok(())
    }

    /// API key used for embeddings, if any.
    pub fn embedding_api_key(&self) -> Option<&str> {
        self.embeddings
            .api_key
            .as_deref()
            .or(self.llm.api_key.as_deref())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.paths.tables_dir(), PathBuf::from("data/txt_tables"));
        assert_eq!(config.paths.vector_dir(), PathBuf::from("data/chromadb"));
        assert_eq!(config.database.kind().unwrap(), DatabaseKind::Text);
        assert_eq!(config.database.mysql_port, 3306);
        assert_eq!(config.agent.max_iterations, 5);
        assert!(config.agent.validate_responses);
        assert!(!config.sms.is_configured());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env_with(lookup(&[
                ("SV_DATA_DIR", "/srv/sv"),
                ("DB_TYPE", "MySQL"),
                ("MYSQL_PORT", "3307"),
                ("OPENAI_API_KEY", "sk-test"),
                ("SMS_API_ENDPOINT", "https://sms.example/send"),
                ("SMS_API_KEY", "sms-key"),
                ("SV_DEBUG_MODE", "true"),
            ]))
            .unwrap();

        assert_eq!(config.paths.tables_dir(), PathBuf::from("/srv/sv/txt_tables"));
        assert_eq!(config.database.kind().unwrap(), DatabaseKind::MySql);
        assert_eq!(config.database.mysql_port, 3307);
        assert_eq!(config.embedding_api_key(), Some("sk-test"));
        assert!(config.sms.is_configured());
        assert!(config.logging.debug_mode);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_with(lookup(&[("MYSQL_PORT", "not-a-port")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MYSQL_PORT"));

        let err = config
            .apply_env_with(lookup(&[("SV_DEBUG_MODE", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_unsupported_database_kind() {
        let mut config = AppConfig::default();
        config.apply_env_with(lookup(&[("DB_TYPE", "postgres")])).unwrap();
        assert!(matches!(
            config.database.kind(),
            Err(ConfigError::UnsupportedDatabase(kind)) if kind == "postgres"
        ));
    }

    #[test]
    fn test_toml_partial_sections() {
        let config = AppConfig::from_toml_str(
            r#"
            [paths]
            data_dir = "/var/lib/sv"

            [agent]
            max_iterations = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.paths.docs_dir(), PathBuf::from("/var/lib/sv/sv_docs"));
        assert_eq!(config.agent.max_iterations, 3);
        assert!(config.agent.validate_responses);
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }
}
