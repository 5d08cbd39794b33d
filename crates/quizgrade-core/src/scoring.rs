//! The scoring engine.
//!
//! Maps each question and its given answer to points, then aggregates into
//! a breakdown and totals. Pure and order-independent: the result depends
//! only on question definitions and answer values, never on presentation
//! order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::answer::{grade, Answer, AnswerKey};
use crate::model::{Question, QuestionId};

/// Per-question scoring detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerBreakdown {
    /// The answer as submitted (`null` when nothing was given).
    pub answer: Value,
    pub is_correct: bool,
    pub points_awarded: f64,
    /// The question's maximum points.
    pub max_points: f64,
}

/// Result of scoring a set of answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSheet {
    /// Sum of awarded points, rounded to 2 decimal places.
    pub obtained: f64,
    /// Sum of every question's points, rounded to 2 decimal places.
    pub total: f64,
    pub breakdown: BTreeMap<QuestionId, AnswerBreakdown>,
}

impl ScoreSheet {
    /// Obtained over total as a percentage, rounded to 2 decimal places.
    /// Zero when the total is zero.
    pub fn percentage(&self) -> f64 {
        if self.total > 0.0 {
            round2(self.obtained / self.total * 100.0)
        } else {
            0.0
        }
    }
}

/// Score a single question against a raw given answer.
pub fn score_question(question: &Question, given: &Value) -> AnswerBreakdown {
    let key = AnswerKey::for_question(question);
    let answer = Answer::decode(question.question_type, given);
    let credit = grade(&key, &answer);
    let max_points = question.max_points();
    let points_awarded = max_points * credit.fraction.clamp(0.0, 1.0);

    tracing::debug!(
        question_id = question.id,
        question_type = %question.question_type,
        is_correct = credit.is_correct,
        points_awarded,
        "scored question"
    );

    AnswerBreakdown {
        answer: given.clone(),
        is_correct: credit.is_correct,
        points_awarded,
        max_points,
    }
}

/// Score every question. Questions without an entry in `answers` are scored
/// as unanswered; answers for unknown question ids are ignored.
pub fn score(questions: &[Question], answers: &BTreeMap<QuestionId, Value>) -> ScoreSheet {
    let mut obtained = 0.0;
    let mut total = 0.0;
    let mut breakdown = BTreeMap::new();

    for question in questions {
        let given = answers.get(&question.id).unwrap_or(&Value::Null);
        let row = score_question(question, given);
        obtained += row.points_awarded;
        total += row.max_points;
        breakdown.insert(question.id, row);
    }

    ScoreSheet {
        obtained: round2(obtained),
        total: round2(total),
        breakdown,
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
