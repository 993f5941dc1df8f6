//! Badge thresholds

/// Badges unlocked by reaching a minimum level, in ascending order
pub const BADGE_THRESHOLDS: &[(u64, &str)] = &[
    (2, "First Level Up"),
    (3, "Dedicated Apprentice"),
    (5, "Advanced Student"),
    (10, "Master of Knowledge"),
    (15, "Neon Legend"),
];

/// Every badge whose threshold is at or below `level`.
///
/// Always computed from scratch, never merged into an earlier set.
pub fn badges_for(level: u64) -> Vec<String> {
    BADGE_THRESHOLDS
        .iter()
        .take_while(|(min_level, _)| level >= *min_level)
        .map(|(_, name)| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_badges_at_level_one() {
        assert!(badges_for(1).is_empty());
    }

    #[test]
    fn test_first_badge() {
        assert_eq!(badges_for(2), vec!["First Level Up"]);
    }

    #[test]
    fn test_intermediate_levels() {
        assert_eq!(badges_for(4), vec!["First Level Up", "Dedicated Apprentice"]);
        assert_eq!(badges_for(9).len(), 3);
        assert_eq!(badges_for(14).len(), 4);
    }

    #[test]
    fn test_all_badges() {
        let all: Vec<&str> = BADGE_THRESHOLDS.iter().map(|(_, name)| *name).collect();
        assert_eq!(badges_for(15), all);
        assert_eq!(badges_for(500), all);
    }

    #[test]
    fn test_badges_never_shrink() {
        let mut previous = badges_for(1);
        for level in 2..40 {
            let current = badges_for(level);
            assert!(current.len() >= previous.len(), "level {}", level);
            assert!(current.starts_with(&previous), "level {}", level);
            previous = current;
        }
    }

    #[test]
    fn test_thresholds_sorted() {
        assert!(BADGE_THRESHOLDS.windows(2).all(|w| w[0].0 < w[1].0));
    }
}
