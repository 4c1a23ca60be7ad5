use thiserror::Error;

/// Top-level error hierarchy for the SportzVillage assistant.
#[derive(Error, Debug)]
pub enum SvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

pub type SvResult<T> = Result<T, SvError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Unsupported database type: {0}")]
    UnsupportedDatabase(String),

    #[error("Missing required setting: {0}")]
    Missing(String),
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to read table {table}: {source}")]
    TableRead {
        table: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write table {table}: {source}")]
    TableWrite {
        table: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid record in {table}: {message}")]
    InvalidRecord { table: String, message: String },

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),
}

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Persistence failed for {path}: {message}")]
    Persistence { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API key not configured: {0}")]
    MissingApiKey(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let db: DatabaseError = VectorStoreError::UnknownCollection("props".into()).into();
        let top: SvError = db.into();
        assert!(top.to_string().contains("Unknown collection: props"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "MYSQL_PORT".into(),
            value: "abc".into(),
        };
        assert_eq!(err.to_string(), "Invalid value for MYSQL_PORT: abc");
    }
}
