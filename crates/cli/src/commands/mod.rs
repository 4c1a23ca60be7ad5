pub mod chat;
pub mod docs;
pub mod history;
pub mod vectordb;

pub use chat::ChatCommand;
pub use docs::DocsCommand;
pub use history::{show_analytics, HistoryCommand};
pub use vectordb::VectorDbCommand;
