//! Aggregate statistics over recorded attempts.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{QuestionId, RecordedAttempt, ResultTier};
use crate::scoring::round2;

/// Aggregate statistics for a set of attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptStats {
    /// Number of attempts summarized.
    pub attempts: usize,
    /// Distinct identified users; anonymous attempts are not counted.
    pub learners: usize,
    /// Mean percentage score.
    pub mean_percentage: f64,
    /// Highest percentage score.
    pub best_percentage: f64,
    /// Share of attempts that passed, 0..=1.
    pub pass_rate: f64,
    /// Mean seconds spent per attempt.
    pub mean_time_taken: f64,
    /// Attempt count per result tier; every tier is present.
    pub tiers: BTreeMap<ResultTier, usize>,
    /// Per-question statistics.
    pub per_question: BTreeMap<QuestionId, QuestionStats>,
}

/// Statistics for a single question across attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStats {
    /// Attempts whose breakdown includes this question.
    pub scored: usize,
    /// Share of those attempts marked correct, 0..=1.
    pub correct_rate: f64,
    /// Mean points awarded.
    pub mean_points: f64,
}

/// Compute aggregate statistics from recorded attempts.
pub fn compute_attempt_stats(attempts: &[RecordedAttempt]) -> AttemptStats {
    let mut tiers: BTreeMap<ResultTier, usize> = [ResultTier::Low, ResultTier::Medium, ResultTier::High]
        .into_iter()
        .map(|t| (t, 0))
        .collect();

    if attempts.is_empty() {
        return AttemptStats {
            attempts: 0,
            learners: 0,
            mean_percentage: 0.0,
            best_percentage: 0.0,
            pass_rate: 0.0,
            mean_time_taken: 0.0,
            tiers,
            per_question: BTreeMap::new(),
        };
    }

    let n = attempts.len() as f64;
    let mut learners = BTreeSet::new();
    let mut percentage_sum = 0.0;
    let mut best = f64::MIN;
    let mut passed = 0usize;
    let mut time_sum = 0.0;
    // (scored, correct, points)
    let mut questions: BTreeMap<QuestionId, (usize, usize, f64)> = BTreeMap::new();

    for recorded in attempts {
        let a = &recorded.attempt;
        if let Some(user) = a.user_id {
            learners.insert(user);
        }
        percentage_sum += a.percentage;
        best = best.max(a.percentage);
        if a.passed {
            passed += 1;
        }
        time_sum += a.time_taken as f64;
        *tiers.entry(a.result_tier).or_default() += 1;

        for row in &a.breakdown {
            let entry = questions.entry(row.question_id).or_default();
            entry.0 += 1;
            if row.is_correct {
                entry.1 += 1;
            }
            entry.2 += row.points_awarded;
        }
    }

    let per_question = questions
        .into_iter()
        .map(|(id, (scored, correct, points))| {
            let m = scored.max(1) as f64;
            (
                id,
                QuestionStats {
                    scored,
                    correct_rate: round2(correct as f64 / m),
                    mean_points: round2(points / m),
                },
            )
        })
        .collect();

    AttemptStats {
        attempts: attempts.len(),
        learners: learners.len(),
        mean_percentage: round2(percentage_sum / n),
        best_percentage: best,
        pass_rate: round2(passed as f64 / n),
        mean_time_taken: round2(time_sum / n),
        tiers,
        per_question,
    }
}
