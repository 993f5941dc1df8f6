//! neonctl library - exposes modules for testing.

pub mod cli;
pub mod client;
pub mod output;
pub mod session;
