//! I/O helpers for scrum commands.

pub mod config;
pub mod init;
pub mod prompt;
pub mod session_store;
pub mod tool_schema;
