//! CLI command handlers, one per file.

mod completions;
mod config;
mod send;

pub use completions::run_completions;
pub use config::run_config;
pub use send::{run_send, SendArgs};

#[cfg(test)]
pub use send::{build_chain, build_request};
