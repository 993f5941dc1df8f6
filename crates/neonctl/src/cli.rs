//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap.
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};

/// Default API base URL
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

/// Neon Learn CLI
#[derive(Parser)]
#[command(name = "neonctl")]
#[command(about = "Neon Learn - track lessons, XP and badges", long_about = None)]
#[command(version)]
pub struct Cli {
    /// API base URL (overrides the saved session)
    #[arg(long, global = true, env = "NEON_SERVER")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and start a session
    Register {
        username: String,
        #[arg(long, env = "NEON_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Start a session for an existing account
    Login {
        username: String,
        #[arg(long, env = "NEON_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the saved session
    Logout,

    /// Show XP, level, badges and progress to the next level
    Progress {
        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Mark a lesson as completed
    Complete { lesson_id: String },

    /// Check that the server is up
    Health,
}
