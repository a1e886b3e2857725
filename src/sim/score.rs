//! Scoring: per-level totals, penalties, and the bonus multiplier

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::BONUS_STEP;

/// Guards the retroactive bonus against float noise (e.g. 100 * 0.19999...)
const BONUS_EPSILON: f64 = 1e-9;

/// Points for a correct answer at `level` before the multiplier
pub fn base_correct_points(level: u8) -> u64 {
    match level {
        2 => 20,
        3 => 30,
        _ => 10,
    }
}

/// Points lost for a wrong answer at `level`
pub fn base_penalty(level: u8) -> u64 {
    match level {
        2 => 10,
        3 => 15,
        _ => 5,
    }
}

/// Multiplier after surviving `bonus_ordinal` bonus questions
pub fn bonus_multiplier(bonus_ordinal: u32) -> f64 {
    1.0 + bonus_ordinal as f64 * BONUS_STEP
}

/// One-time completion bonus: the multiplier applied to the deflated base score
pub fn completion_bonus(level_score: u64, multiplier: f64) -> u64 {
    if multiplier <= 1.0 {
        return 0;
    }
    let base = level_score as f64 / multiplier;
    (base * (multiplier - 1.0) + BONUS_EPSILON).floor() as u64
}

/// Score state for one player session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBoard {
    total: u64,
    level_scores: BTreeMap<u8, u64>,
    multiplier: f64,
    /// Per-level base points; levels missing here use the built-in table
    #[serde(default)]
    points: BTreeMap<u8, (u64, u64)>,
}

impl Default for ScoreBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self {
            total: 0,
            level_scores: BTreeMap::new(),
            multiplier: 1.0,
            points: BTreeMap::new(),
        }
    }

    /// Override the correct/penalty points for a level (from level config)
    pub fn set_level_points(&mut self, level: u8, correct: u64, penalty: u64) {
        self.points.insert(level, (correct, penalty));
    }

    fn correct_points(&self, level: u8) -> u64 {
        self.points
            .get(&level)
            .map(|p| p.0)
            .unwrap_or_else(|| base_correct_points(level))
    }

    fn penalty_points(&self, level: u8) -> u64 {
        self.points
            .get(&level)
            .map(|p| p.1)
            .unwrap_or_else(|| base_penalty(level))
    }

    /// Award a correct answer; returns the points added
    pub fn credit_correct(&mut self, level: u8) -> u64 {
        let points = (self.correct_points(level) as f64 * self.multiplier).round() as u64;
        self.add_points(level, points);
        points
    }

    /// Apply the wrong-answer penalty; both totals floor at zero.
    /// Returns the nominal (negative) delta.
    pub fn apply_penalty(&mut self, level: u8) -> i64 {
        let penalty = self.penalty_points(level);
        self.total = self.total.saturating_sub(penalty);
        let entry = self.level_scores.entry(level).or_insert(0);
        *entry = entry.saturating_sub(penalty);
        -(penalty as i64)
    }

    pub fn add_points(&mut self, level: u8, points: u64) {
        self.total += points;
        *self.level_scores.entry(level).or_insert(0) += points;
    }

    pub fn set_bonus_multiplier(&mut self, bonus_ordinal: u32) {
        self.multiplier = bonus_multiplier(bonus_ordinal);
    }

    pub fn reset_multiplier(&mut self) {
        self.multiplier = 1.0;
    }

    /// Add the retroactive completion bonus for `level`; returns it
    pub fn apply_completion_bonus(&mut self, level: u8) -> u64 {
        let bonus = completion_bonus(self.level_score(level), self.multiplier);
        if bonus > 0 {
            self.add_points(level, bonus);
        }
        bonus
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn level_score(&self, level: u8) -> u64 {
        self.level_scores.get(&level).copied().unwrap_or(0)
    }

    pub fn level_scores(&self) -> &BTreeMap<u8, u64> {
        &self.level_scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_credit_scales_with_level_and_multiplier() {
        let mut score = ScoreBoard::new();
        assert_eq!(score.credit_correct(1), 10);
        assert_eq!(score.credit_correct(2), 20);
        assert_eq!(score.credit_correct(3), 30);
        assert_eq!(score.total(), 60);

        score.set_bonus_multiplier(1);
        assert_eq!(score.credit_correct(2), 24);
        assert_eq!(score.level_score(2), 44);

        score.reset_multiplier();
        assert_eq!(score.multiplier(), 1.0);
    }

    #[test]
    fn test_penalty_floors_at_zero() {
        let mut score = ScoreBoard::new();
        score.add_points(2, 5);
        assert_eq!(score.apply_penalty(2), -10);
        assert_eq!(score.level_score(2), 0);
        assert_eq!(score.total(), 0);
        assert_eq!(score.apply_penalty(2), -10);
        assert_eq!(score.level_score(2), 0);
    }

    #[test]
    fn test_totals_floor_independently() {
        let mut score = ScoreBoard::new();
        score.add_points(1, 100);
        score.add_points(2, 5);
        score.apply_penalty(2);
        assert_eq!(score.level_score(2), 0);
        assert_eq!(score.total(), 95);
        assert_eq!(score.level_score(1), 100);
    }

    #[test]
    fn test_multiplier_formula() {
        assert!((bonus_multiplier(0) - 1.0).abs() < 1e-12);
        assert!((bonus_multiplier(1) - 1.2).abs() < 1e-12);
        assert!((bonus_multiplier(3) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_completion_bonus() {
        assert_eq!(completion_bonus(160, bonus_multiplier(3)), 60);
        assert_eq!(completion_bonus(120, bonus_multiplier(1)), 20);
        assert_eq!(completion_bonus(500, 1.0), 0);

        let mut score = ScoreBoard::new();
        score.add_points(1, 160);
        score.set_bonus_multiplier(3);
        assert_eq!(score.apply_completion_bonus(1), 60);
        assert_eq!(score.level_score(1), 220);
    }

    #[test]
    fn test_level_point_overrides() {
        let mut score = ScoreBoard::new();
        score.set_level_points(7, 50, 25);
        assert_eq!(score.credit_correct(7), 50);
        assert_eq!(score.apply_penalty(7), -25);
        // Unknown levels use the level-1 table
        assert_eq!(score.credit_correct(9), 10);
    }

    proptest! {
        #[test]
        fn prop_scores_never_negative(ops in proptest::collection::vec((1u8..4, any::<bool>()), 0..64)) {
            let mut score = ScoreBoard::new();
            let mut expected_total: u64 = 0;
            for (level, correct) in ops {
                if correct {
                    expected_total += score.credit_correct(level);
                } else {
                    score.apply_penalty(level);
                    expected_total = expected_total.saturating_sub(base_penalty(level));
                }
            }
            prop_assert_eq!(score.total(), expected_total);
            let level_sum: u64 = score.level_scores().values().sum();
            prop_assert!(level_sum >= score.total());
        }
    }
}
