pub mod config;
pub mod errors;
pub mod structured_logging;

pub use structured_logging::{
    init_structured_logging,
    LoggingConfig,
    StructuredLogEntry,
    ExecutionContext,
    OperationTimer,
    RequestContext,
};

pub use errors::{
    ConfigError,
    DatabaseError,
    LlmError,
    SvError,
    SvResult,
    VectorStoreError,
};

pub use config::{
    AgentSettings,
    AppConfig,
    DatabaseConfig,
    DatabaseKind,
    EmbeddingConfig,
    LlmConfig,
    LoggingSettings,
    PathsConfig,
    SmsConfig,
};
