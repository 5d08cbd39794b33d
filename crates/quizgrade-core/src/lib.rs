//! quizgrade-core: Scoring and attempt-validation engine.
//!
//! This crate defines the quiz data model, the per-type scoring rules, the
//! result tier classifier, the availability and attempt-limit gates, the
//! presentation randomizer, and the recorder that ties them together over
//! the persistence traits implemented by `quizgrade-store`. Quiz files are
//! loaded and linted by [`parser`]; [`statistics`] summarizes recorded
//! attempts.

pub mod answer;
pub mod error;
pub mod model;
pub mod parser;
pub mod randomizer;
pub mod recorder;
pub mod scoring;
pub mod statistics;
pub mod tier;
pub mod traits;
pub mod validator;

pub use error::{PersistError, RecordError};
pub use model::{normalize_type, QuestionType, ResultTier};
pub use recorder::{AttemptRecorder, SubmitOutcome, Submission};
pub use scoring::score;
pub use tier::classify_tier;
pub use validator::{validate_access, validate_availability, validate_limits};
