//! OCP debugger
//!
//! Line-mode debugger for compiled transliteration programs. It drives a
//! `Machine` through the public step and observer API only.

pub mod commands;
mod session;

pub use commands::{Command, parse};
pub use session::{PROMPT, Session};

#[derive(Debug, thiserror::Error)]
pub enum DebugError {
    #[error("debugger I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
