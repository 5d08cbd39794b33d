//! Attempt recorder.
//!
//! Orchestrates one submission: load the quiz, gate the attempt, score it,
//! classify the tier, and hand the immutable record to the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{PersistError, RecordError};
use crate::model::{
    Attempt, AttemptAnswer, QuestionId, QuizBundle, QuizRef, RecordedAttempt, ResultTier,
    StudentInfo, UserId,
};
use crate::scoring::score;
use crate::tier::classify_tier;
use crate::traits::{AttemptStore, QuizSource};
use crate::validator::{
    validate_access, validate_availability, validate_limits, AttemptLimits, Learner, Rejection,
    Verdict,
};

/// A learner's submission as received from the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Roles granted by the host platform.
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub student: StudentInfo,
    /// Seconds spent on the attempt.
    #[serde(default)]
    pub time_taken: u64,
    /// Raw answers keyed by question id.
    #[serde(default)]
    pub answers: BTreeMap<QuestionId, Value>,
    /// Set by the host; defaults to the time of recording.
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn learner(&self) -> Learner {
        Learner {
            user_id: self.user_id,
            roles: self.roles.clone(),
        }
    }
}

/// What happened to a submission.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Recorded(RecordedAttempt),
    /// Gated out; nothing was persisted.
    Rejected(Rejection),
}

/// Score a submission against a quiz and build the attempt record.
///
/// Pure: no gates are applied and nothing is persisted.
pub fn assemble_attempt(bundle: &QuizBundle, submission: Submission, now: DateTime<Utc>) -> Attempt {
    let sheet = score(&bundle.questions, &submission.answers);
    let percentage = sheet.percentage();
    let result_tier = classify_tier(sheet.obtained, sheet.total, bundle.quiz.pass_percentage);
    // Same unrounded comparison as the tier, so `passed` never disagrees with `low`.
    let passed = sheet.total > 0.0 && result_tier != ResultTier::Low;

    let breakdown = bundle
        .questions
        .iter()
        .filter_map(|q| {
            sheet.breakdown.get(&q.id).map(|row| AttemptAnswer {
                question_id: q.id,
                answer: row.answer.clone(),
                is_correct: row.is_correct,
                points_awarded: row.points_awarded,
            })
        })
        .collect();

    let mut answers = submission.answers;
    answers.retain(|id, _| sheet.breakdown.contains_key(id));

    Attempt {
        reference: Uuid::new_v4(),
        quiz_id: bundle.quiz.id,
        user_id: submission.user_id,
        student: submission.student,
        obtained_marks: sheet.obtained,
        total_marks: sheet.total,
        percentage,
        passed,
        result_tier,
        time_taken: submission.time_taken,
        answers,
        breakdown,
        submitted_at: submission.submitted_at.unwrap_or(now),
    }
}

/// Records submissions through the persistence collaborators.
pub struct AttemptRecorder {
    source: Arc<dyn QuizSource>,
    store: Arc<dyn AttemptStore>,
}

impl AttemptRecorder {
    pub fn new(source: Arc<dyn QuizSource>, store: Arc<dyn AttemptStore>) -> Self {
        Self { source, store }
    }

    async fn load(&self, quiz: &QuizRef) -> Result<QuizBundle, RecordError> {
        self.source
            .load(quiz)
            .await
            .map_err(|source| RecordError::Source {
                quiz: *quiz,
                source,
            })?
            .ok_or(RecordError::QuizNotFound(*quiz))
    }

    /// Run every gate for `learner` without recording anything.
    ///
    /// Hosts call this before rendering the quiz so a learner who cannot
    /// submit is told up front.
    pub async fn check(
        &self,
        quiz: &QuizRef,
        learner: &Learner,
        now: DateTime<Utc>,
    ) -> Result<Verdict, RecordError> {
        let bundle = self.load(quiz).await?;
        self.gate(&bundle, learner, now).await
    }

    async fn gate(
        &self,
        bundle: &QuizBundle,
        learner: &Learner,
        now: DateTime<Utc>,
    ) -> Result<Verdict, RecordError> {
        let quiz = &bundle.quiz;
        let verdict = validate_access(quiz, learner).and_then(|| validate_availability(quiz, now));
        if !verdict.allowed {
            return Ok(verdict);
        }

        let counts = self
            .store
            .counts(quiz.id, learner.user_id)
            .await
            .map_err(RecordError::Counts)?;
        Ok(validate_limits(quiz, learner.user_id, counts))
    }

    /// Gate, score and persist one submission.
    pub async fn submit(
        &self,
        quiz: &QuizRef,
        submission: Submission,
    ) -> Result<SubmitOutcome, RecordError> {
        let bundle = self.load(quiz).await?;
        let now = submission.submitted_at.unwrap_or_else(Utc::now);

        if let Err(rejection) = self
            .gate(&bundle, &submission.learner(), now)
            .await?
            .into_result()
        {
            tracing::warn!(quiz_id = bundle.quiz.id, user_id = ?submission.user_id, "submission rejected: {rejection}");
            return Ok(SubmitOutcome::Rejected(rejection));
        }

        let attempt = assemble_attempt(&bundle, submission, now);
        let limits = AttemptLimits::for_quiz(&bundle.quiz);

        match self.store.persist(&attempt, limits).await {
            Ok(id) => {
                tracing::info!(
                    quiz_id = attempt.quiz_id,
                    attempt_id = id,
                    obtained = attempt.obtained_marks,
                    total = attempt.total_marks,
                    tier = %attempt.result_tier,
                    "attempt recorded"
                );
                Ok(SubmitOutcome::Recorded(RecordedAttempt { id, attempt }))
            }
            Err(PersistError::LimitReached(rejection)) => {
                tracing::warn!(quiz_id = attempt.quiz_id, "attempt ceiling hit at write time: {rejection}");
                Ok(SubmitOutcome::Rejected(rejection))
            }
            Err(PersistError::Backend(e)) => Err(RecordError::Persistence(e)),
        }
    }
}
