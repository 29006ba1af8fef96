//! Deterministic confidence tiering.
//!
//! The tier is computed from the numeric score alone. Any confidence label the
//! classifier reports about itself is ignored.

use crate::types::ConfidenceTier;

/// Lowest score treated as HIGH confidence.
pub const HIGH_THRESHOLD: u8 = 80;

/// Lowest score treated as MID confidence.
pub const MID_THRESHOLD: u8 = 55;

/// Upper bound of the score range.
pub const MAX_SCORE: u8 = 100;

/// Clamp an arbitrary integer into `[0, MAX_SCORE]`.
pub fn clamp_score(score: i64) -> u8 {
    score.clamp(0, MAX_SCORE as i64) as u8
}

impl ConfidenceTier {
    /// Tier for a score; values above 100 behave like 100.
    pub fn from_score(score: u8) -> Self {
        if score >= HIGH_THRESHOLD {
            ConfidenceTier::High
        } else if score >= MID_THRESHOLD {
            ConfidenceTier::Mid
        } else {
            ConfidenceTier::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(ConfidenceTier::from_score(0), ConfidenceTier::Low);
        assert_eq!(ConfidenceTier::from_score(54), ConfidenceTier::Low);
        assert_eq!(ConfidenceTier::from_score(55), ConfidenceTier::Mid);
        assert_eq!(ConfidenceTier::from_score(79), ConfidenceTier::Mid);
        assert_eq!(ConfidenceTier::from_score(80), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_score(100), ConfidenceTier::High);
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-20), 0);
        assert_eq!(clamp_score(0), 0);
        assert_eq!(clamp_score(67), 67);
        assert_eq!(clamp_score(100), 100);
        assert_eq!(clamp_score(250), 100);
        assert_eq!(clamp_score(i64::MIN), 0);
        assert_eq!(clamp_score(i64::MAX), 100);
    }
}
