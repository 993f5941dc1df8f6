//! Per-account progress state and the lesson-completion transition.
//!
//! `UserProgress` only changes through [`UserProgress::complete_lesson`],
//! which routes every XP award through a single private transition. Level
//! and badges are recomputed together inside that transition, so a persisted
//! record can never hold a level whose badges were not refreshed.

use super::badges::badges_for;
use super::levels::{level_for, progress_to_next_level, LevelProgress, STARTING_LEVEL};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// XP granted for each completed lesson
pub const LESSON_XP: u64 = 20;

/// Why a lesson completion was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LessonCompletionError {
    #[error("Lesson already completed: {0}")]
    AlreadyCompleted(String),

    #[error("Lesson ID required")]
    EmptyLessonId,
}

/// XP, level, badges and completed lessons for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub xp: u64,
    pub level: u64,
    pub badges: Vec<String>,
    pub lessons_completed: Vec<String>,
}

/// Result of a successful lesson completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonOutcome {
    pub progress: UserProgress,
    pub xp_earned: u64,
    pub leveled_up: bool,
    /// Set only when `leveled_up`
    pub new_level: Option<u64>,
}

impl UserProgress {
    /// Progress of a freshly registered account
    pub fn new() -> Self {
        Self {
            xp: 0,
            level: STARTING_LEVEL,
            badges: Vec::new(),
            lessons_completed: Vec::new(),
        }
    }

    pub fn has_completed(&self, lesson_id: &str) -> bool {
        self.lessons_completed.iter().any(|l| l == lesson_id)
    }

    /// Apply a lesson completion, leaving `self` untouched.
    ///
    /// Rejects lessons already in `lessons_completed`. Otherwise awards
    /// `LESSON_XP`, recomputes the level, and rebuilds the badge set only
    /// when the level went up.
    pub fn complete_lesson(&self, lesson_id: &str) -> Result<LessonOutcome, LessonCompletionError> {
        if lesson_id.trim().is_empty() {
            return Err(LessonCompletionError::EmptyLessonId);
        }
        if self.has_completed(lesson_id) {
            return Err(LessonCompletionError::AlreadyCompleted(lesson_id.to_string()));
        }

        let mut progress = self.clone();
        let leveled_up = progress.award_xp(LESSON_XP);
        progress.lessons_completed.push(lesson_id.to_string());

        Ok(LessonOutcome {
            new_level: leveled_up.then_some(progress.level),
            progress,
            xp_earned: LESSON_XP,
            leveled_up,
        })
    }

    /// Progress towards the next level, from the stored level
    pub fn progress_to_next_level(&self) -> LevelProgress {
        progress_to_next_level(self.xp, self.level)
    }

    /// Describe every way this record breaks the level/badge invariants.
    ///
    /// Empty for any record produced by `new` and `complete_lesson`.
    pub fn inconsistencies(&self) -> Vec<String> {
        let mut issues = Vec::new();

        let expected_level = level_for(self.xp);
        if self.level != expected_level {
            issues.push(format!(
                "level {} does not match xp {} (expected level {})",
                self.level, self.xp, expected_level
            ));
        }

        let expected_badges = badges_for(self.level);
        if self.badges != expected_badges {
            issues.push(format!(
                "badges {:?} do not match level {} (expected {:?})",
                self.badges, self.level, expected_badges
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for lesson in &self.lessons_completed {
            if !seen.insert(lesson.as_str()) {
                issues.push(format!("lesson {} recorded more than once", lesson));
            }
        }

        issues
    }

    /// The only place XP changes. Returns whether the level went up.
    fn award_xp(&mut self, amount: u64) -> bool {
        let old_level = self.level;
        self.xp = self.xp.saturating_add(amount);
        self.level = level_for(self.xp);

        let leveled_up = self.level > old_level;
        if leveled_up {
            self.badges = badges_for(self.level);
        }
        leveled_up
    }
}

impl Default for UserProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(progress: &UserProgress, lesson: &str) -> LessonOutcome {
        progress.complete_lesson(lesson).unwrap()
    }

    #[test]
    fn test_new_progress() {
        let progress = UserProgress::new();
        assert_eq!(progress.xp, 0);
        assert_eq!(progress.level, 1);
        assert!(progress.badges.is_empty());
        assert!(progress.lessons_completed.is_empty());
        assert!(progress.inconsistencies().is_empty());
    }

    #[test]
    fn test_first_lesson() {
        let outcome = complete(&UserProgress::new(), "lesson-1");

        assert_eq!(outcome.progress.xp, 20);
        assert_eq!(outcome.progress.level, 1);
        assert_eq!(outcome.xp_earned, 20);
        assert!(!outcome.leveled_up);
        assert_eq!(outcome.new_level, None);
        assert_eq!(outcome.progress.lessons_completed, vec!["lesson-1"]);
    }

    #[test]
    fn test_fifth_lesson_levels_up() {
        let mut progress = UserProgress::new();
        let mut last = None;
        for i in 1..=5 {
            let outcome = complete(&progress, &format!("lesson-{}", i));
            progress = outcome.progress.clone();
            last = Some(outcome);
        }
        let last = last.unwrap();

        assert_eq!(progress.xp, 100);
        assert_eq!(progress.level, 2);
        assert!(last.leveled_up);
        assert_eq!(last.new_level, Some(2));
        assert_eq!(progress.badges, vec!["First Level Up"]);
        assert_eq!(progress.lessons_completed.len(), 5);
    }

    #[test]
    fn test_repeat_lesson_rejected() {
        let after_first = complete(&UserProgress::new(), "intro").progress;

        let err = after_first.complete_lesson("intro").unwrap_err();
        assert_eq!(err, LessonCompletionError::AlreadyCompleted("intro".to_string()));

        // Rejection leaves the state exactly as after the first completion
        assert_eq!(after_first.xp, 20);
        assert_eq!(after_first.lessons_completed, vec!["intro"]);
    }

    #[test]
    fn test_input_not_mutated() {
        let original = UserProgress::new();
        let _ = complete(&original, "lesson-1");
        assert_eq!(original, UserProgress::new());
    }

    #[test]
    fn test_empty_lesson_id_rejected() {
        let progress = UserProgress::new();
        assert_eq!(progress.complete_lesson(""), Err(LessonCompletionError::EmptyLessonId));
        assert_eq!(progress.complete_lesson("   "), Err(LessonCompletionError::EmptyLessonId));
    }

    #[test]
    fn test_badges_unchanged_without_level_up() {
        // A record whose badges lag its level keeps them until the next level-up
        let stale = UserProgress {
            xp: 100,
            level: 2,
            badges: Vec::new(),
            lessons_completed: vec!["a".into()],
        };
        let outcome = complete(&stale, "b");
        assert!(!outcome.leveled_up);
        assert!(outcome.progress.badges.is_empty());

        let at_edge = UserProgress { xp: 180, ..stale };
        let outcome = complete(&at_edge, "c");
        assert!(outcome.leveled_up);
        assert_eq!(outcome.progress.badges, vec!["First Level Up", "Dedicated Apprentice"]);
    }

    #[test]
    fn test_long_run_stays_consistent() {
        let mut progress = UserProgress::new();
        let mut level_ups = 0;
        for i in 0..75 {
            let outcome = complete(&progress, &format!("lesson-{}", i));
            if outcome.leveled_up {
                level_ups += 1;
            }
            progress = outcome.progress;
            assert!(progress.inconsistencies().is_empty(), "after lesson {}", i);
        }

        assert_eq!(progress.xp, 1_500);
        assert_eq!(progress.level, 16);
        assert_eq!(level_ups, 15);
        assert_eq!(progress.badges.len(), 5);
        assert_eq!(progress.badges.last().map(String::as_str), Some("Neon Legend"));
    }

    #[test]
    fn test_progress_to_next_level() {
        let progress = UserProgress {
            xp: 150,
            level: 2,
            badges: badges_for(2),
            lessons_completed: Vec::new(),
        };
        let next = progress.progress_to_next_level();
        assert!((next.percent - 50.0).abs() < f64::EPSILON);
        assert_eq!(next.xp_remaining, 50);
    }

    #[test]
    fn test_inconsistencies_reported() {
        let broken = UserProgress {
            xp: 250,
            level: 2,
            badges: Vec::new(),
            lessons_completed: vec!["x".into(), "x".into()],
        };
        let issues = broken.inconsistencies();
        assert_eq!(issues.len(), 3);
        assert!(issues[0].contains("expected level 3"));
    }

    #[test]
    fn test_serde_camel_case() {
        let json = serde_json::to_value(UserProgress::new()).unwrap();
        assert!(json.get("lessonsCompleted").is_some());
        assert!(json.get("lessons_completed").is_none());
    }
}
