//! Store error types.

use std::path::PathBuf;

use quizgrade_core::model::QuizId;
use thiserror::Error;

/// Errors that can occur when reading or writing a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored attempt record could not be decoded.
    #[error("corrupt attempt record {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Two quizzes share a surrogate id.
    #[error("duplicate quiz id: {0}")]
    DuplicateQuiz(QuizId),

    /// The store root is unusable.
    #[error("store root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
