//! `sv-assistant` command-line front end.

pub mod commands;
pub mod progress;
pub mod runtime;

pub use runtime::Runtime;
