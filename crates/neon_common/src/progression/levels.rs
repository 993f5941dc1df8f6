//! Level System
//!
//! Flat XP curve: every level spans exactly `XP_PER_LEVEL` points.
//!
//! - Level 1: 0-99 XP
//! - Level 2: 100-199 XP
//! - Level N: (N-1)*100 .. N*100-1 XP
//!
//! There is no level cap.

use serde::{Deserialize, Serialize};

/// XP needed to advance one level
pub const XP_PER_LEVEL: u64 = 100;

/// Level of a fresh account
pub const STARTING_LEVEL: u64 = 1;

/// Level for a given XP total: `floor(xp / 100) + 1`
pub fn level_for(xp: u64) -> u64 {
    xp / XP_PER_LEVEL + STARTING_LEVEL
}

/// Total XP at which `level` begins
pub fn xp_for_level(level: u64) -> u64 {
    level.saturating_sub(STARTING_LEVEL).saturating_mul(XP_PER_LEVEL)
}

/// Progress within the current level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    /// Percent of the current level completed, in [0, 100]
    pub percent: f64,
    /// XP still needed to reach the next level
    pub xp_remaining: u64,
}

/// Progress from `level`'s floor towards the next level.
///
/// The percentage is clamped to [0, 100]. With `level == level_for(xp)` the
/// value always lands in [0, 100) already; the clamp only matters for a
/// stored record whose level disagrees with its XP.
pub fn progress_to_next_level(xp: u64, level: u64) -> LevelProgress {
    let current_level_xp = xp_for_level(level);
    let next_level_xp = xp_for_level(level.saturating_add(1));
    let span = next_level_xp.saturating_sub(current_level_xp).max(1);

    let gained = xp as f64 - current_level_xp as f64;
    let percent = (gained / span as f64 * 100.0).clamp(0.0, 100.0);

    LevelProgress {
        percent,
        xp_remaining: next_level_xp.saturating_sub(xp),
    }
}
