//! Progression Module
//!
//! Gamified learning progress: XP, levels, and badges.
//!
//! ## Level System
//!
//! - 100 XP per level, starting at level 1, no cap
//! - Each completed lesson is worth a fixed 20 XP, once per lesson
//!
//! ## Badges
//!
//! - Unlocked at fixed level thresholds
//! - Rebuilt from scratch on every level-up

pub mod badges;
pub mod levels;
pub mod progress;

pub use badges::{badges_for, BADGE_THRESHOLDS};
pub use levels::{
    level_for, progress_to_next_level, xp_for_level, LevelProgress, STARTING_LEVEL, XP_PER_LEVEL,
};
pub use progress::{LessonCompletionError, LessonOutcome, UserProgress, LESSON_XP};
