/// Minimum percentage of correct answers that counts as a pass.
pub const PASSING_PERCENT: f64 = 70.0;

/// Final score of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreReport {
    score: u32,
    total: usize,
}

impl ScoreReport {
    #[must_use]
    pub fn new(score: u32, total: usize) -> Self {
        Self { score, total }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Share of correct answers in `[0, 100]`; an empty session scores 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.score) / self.total as f64 * 100.0
    }

    /// Percentage rounded to the nearest whole number.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rounded_percentage(&self) -> u8 {
        self.percentage().round().clamp(0.0, 100.0) as u8
    }

    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.total > 0 && self.percentage() >= PASSING_PERCENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_session_scores_zero() {
        let report = ScoreReport::new(0, 0);
        assert_eq!(report.percentage(), 0.0);
        assert_eq!(report.rounded_percentage(), 0);
        assert!(!report.is_approved());
    }

    #[test]
    fn pass_mark_is_inclusive() {
        assert!(ScoreReport::new(7, 10).is_approved());
        assert!(!ScoreReport::new(6, 10).is_approved());
    }

    #[test]
    fn percentage_rounds() {
        assert_eq!(ScoreReport::new(2, 3).rounded_percentage(), 67);
        assert_eq!(ScoreReport::new(3, 3).rounded_percentage(), 100);
    }
}
