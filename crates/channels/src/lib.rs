//! Channel implementations for Docent.
//!
//! A channel is where a chat session reads user lines and writes replies.
//!
//! Available channels:
//! - **Console** — Interactive terminal chat (stdin/stdout)

pub mod console;

pub use console::{ConsoleInput, ConsoleOutput};
