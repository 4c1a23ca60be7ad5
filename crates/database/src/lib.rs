//! Data access for the SportzVillage assistant.
//!
//! `Database` is the capability interface every tool works against. The text
//! backend reads pipe-separated tables from disk; the MySQL backend is a
//! placeholder. `ChatLogger` keeps the CSV/JSON interaction audit trail.

pub mod chat_logger;
pub mod interface;
pub mod mysql;
mod table;
pub mod text_db;

pub use chat_logger::{
    classify_message, generate_session_id, ChatAnalytics, ChatInteraction, ChatLogger, ChatUser,
    LlmLogData,
};
pub use interface::{open_database, Database};
pub use mysql::MySqlDatabase;
pub use text_db::TextDatabase;
