//! Neon Common - Shared types for Neon Learn
//!
//! The progression engine, HTTP schemas, and configuration used by both the
//! daemon and the CLI.

pub mod api;
pub mod config;
pub mod progression;

pub use api::*;
pub use config::NeonConfig;
pub use progression::{
    badges_for, level_for, LessonCompletionError, LessonOutcome, LevelProgress, UserProgress,
};
