//! Engine error types.
//!
//! Malformed quiz content never produces an error; these cover structural
//! failures only. Defined here so callers can tell a missing quiz from a
//! storage failure without string matching.

use thiserror::Error;

use crate::model::QuizRef;
use crate::validator::Rejection;

/// Errors from recording a submission.
#[derive(Debug, Error)]
pub enum RecordError {
    /// No quiz matches the reference.
    #[error("quiz not found: {0}")]
    QuizNotFound(QuizRef),

    /// The quiz source failed.
    #[error("failed to load quiz {quiz}: {source:#}")]
    Source {
        quiz: QuizRef,
        source: anyhow::Error,
    },

    /// Reading attempt counts failed.
    #[error("failed to read attempt counts: {0:#}")]
    Counts(#[source] anyhow::Error),

    /// Writing the attempt failed.
    #[error("failed to persist attempt: {0:#}")]
    Persistence(#[source] anyhow::Error),
}

/// Errors returned by [`crate::traits::AttemptStore::persist`].
#[derive(Debug, Error)]
pub enum PersistError {
    /// A ceiling was hit at write time.
    #[error("{0}")]
    LimitReached(Rejection),

    /// The backend failed to write.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl RecordError {
    /// Returns `true` if the caller addressed a quiz that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RecordError::QuizNotFound(_))
    }
}
