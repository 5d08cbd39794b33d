//! Persistence collaborator traits.
//!
//! The engine reads quizzes and writes attempts through these traits; the
//! `quizgrade-store` crate provides in-memory and directory-backed
//! implementations. Implementations own atomicity of writes, the
//! serialization of attempt-ceiling checks, and invalidation of any cached
//! quiz data after a write.

use async_trait::async_trait;

use crate::error::PersistError;
use crate::model::{Attempt, AttemptId, QuizBundle, QuizId, QuizRef, RecordedAttempt, UserId};
use crate::validator::{AttemptCounts, AttemptLimits};

/// Source of quiz definitions.
#[async_trait]
pub trait QuizSource: Send + Sync {
    /// Look up a quiz and its questions. `Ok(None)` when no such quiz exists.
    async fn load(&self, quiz: &QuizRef) -> anyhow::Result<Option<QuizBundle>>;
}

/// Sink and counter for graded attempts.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Recorded attempts for a quiz, overall and for `user_id`.
    async fn counts(&self, quiz_id: QuizId, user_id: Option<UserId>) -> anyhow::Result<AttemptCounts>;

    /// Persist an attempt and return its identifier.
    ///
    /// Implementations must re-check `limits` against their own counts
    /// atomically with the insert and return [`PersistError::LimitReached`]
    /// when a concurrent submission got there first.
    async fn persist(&self, attempt: &Attempt, limits: AttemptLimits) -> Result<AttemptId, PersistError>;

    /// Recorded attempts for a quiz, optionally filtered to one user, oldest first.
    async fn list(&self, quiz_id: QuizId, user_id: Option<UserId>) -> anyhow::Result<Vec<RecordedAttempt>>;
}
