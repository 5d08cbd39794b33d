//! Core data model types for quizgrade.
//!
//! Quizzes and questions are authored elsewhere and only read here;
//! attempts are produced once per submission and never mutated.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::answer::{lenient_list, lenient_pairs};

pub type QuizId = u64;
pub type QuestionId = u64;
pub type UserId = u64;
pub type AttemptId = u64;

// ---------------------------------------------------------------------------
// Question type registry
// ---------------------------------------------------------------------------

/// The closed set of supported question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum QuestionType {
    #[default]
    Radio,
    Checkbox,
    Dropdown,
    Text,
    ShortText,
    Number,
    Date,
    Banner,
    FillBlank,
    Matching,
    Sequence,
}

impl QuestionType {
    /// Every supported type, in registry order.
    pub const ALL: [QuestionType; 11] = [
        QuestionType::Radio,
        QuestionType::Checkbox,
        QuestionType::Dropdown,
        QuestionType::Text,
        QuestionType::ShortText,
        QuestionType::Number,
        QuestionType::Date,
        QuestionType::Banner,
        QuestionType::FillBlank,
        QuestionType::Matching,
        QuestionType::Sequence,
    ];

    /// The stored tag for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Radio => "radio",
            QuestionType::Checkbox => "checkbox",
            QuestionType::Dropdown => "dropdown",
            QuestionType::Text => "text",
            QuestionType::ShortText => "short_text",
            QuestionType::Number => "number",
            QuestionType::Date => "date",
            QuestionType::Banner => "banner",
            QuestionType::FillBlank => "fill_blank",
            QuestionType::Matching => "matching",
            QuestionType::Sequence => "sequence",
        }
    }

    /// Types whose `options` are selectable labels and may be shuffled.
    pub fn has_choice_options(self) -> bool {
        matches!(
            self,
            QuestionType::Radio | QuestionType::Checkbox | QuestionType::Dropdown
        )
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse: unknown tags are an error. Stored data goes through
/// [`normalize_type`] instead.
impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        QuestionType::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| format!("unknown question type: {}", s.trim()))
    }
}

/// Map a raw type tag onto the registry, falling back to `radio`.
pub fn normalize_type(raw: &str) -> QuestionType {
    match raw.parse() {
        Ok(t) => t,
        Err(_) => {
            tracing::debug!("question type '{raw}' not recognised, using radio");
            QuestionType::Radio
        }
    }
}

impl From<String> for QuestionType {
    fn from(raw: String) -> Self {
        normalize_type(&raw)
    }
}

impl From<QuestionType> for &'static str {
    fn from(t: QuestionType) -> Self {
        t.as_str()
    }
}

// ---------------------------------------------------------------------------
// Quiz
// ---------------------------------------------------------------------------

/// A quiz definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    /// Surrogate identifier.
    pub id: QuizId,
    /// Public opaque identifier used in embed codes.
    #[serde(default)]
    pub uuid: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Seconds allowed for an attempt; 0 means unlimited.
    #[serde(default)]
    pub time_limit: u64,
    /// Legacy per-user ceiling, used when `max_user_attempts` is 0.
    #[serde(default)]
    pub attempts_allowed: u32,
    /// Ceiling on attempts across all users; 0 means unlimited.
    #[serde(default)]
    pub max_total_attempts: u32,
    /// Ceiling on attempts per identified user; 0 means unlimited.
    #[serde(default)]
    pub max_user_attempts: u32,
    /// Pass bar in percent, clamped to 0..=100.
    #[serde(
        default = "default_pass_percentage",
        deserialize_with = "deserialize_percentage"
    )]
    pub pass_percentage: f64,
    #[serde(default)]
    pub randomize_questions: bool,
    #[serde(default)]
    pub randomize_answers: bool,
    #[serde(default)]
    pub scheduled_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scheduled_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub require_login: bool,
    #[serde(default)]
    pub required_role: Option<String>,
    /// Contact-detail collection settings; carried but not used for scoring.
    #[serde(default)]
    pub lead_capture: LeadCapture,
}

impl Quiz {
    /// The per-user ceiling in effect, honouring the legacy field.
    pub fn effective_user_limit(&self) -> u32 {
        if self.max_user_attempts > 0 {
            self.max_user_attempts
        } else {
            self.attempts_allowed
        }
    }

    /// Whether `quiz_ref` addresses this quiz.
    pub fn matches(&self, quiz_ref: &QuizRef) -> bool {
        match quiz_ref {
            QuizRef::Id(id) => self.id == *id,
            QuizRef::Public(uuid) => self.uuid.as_ref() == Some(uuid),
        }
    }
}

/// Lead-capture configuration attached to a quiz.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadCapture {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub fields: Vec<LeadField>,
}

/// A single lead-capture form field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadField {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
}

pub(crate) fn default_pass_percentage() -> f64 {
    50.0
}

/// Clamp a pass percentage into 0..=100; non-finite values fall back to the default.
pub fn clamp_percentage(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.clamp(0.0, 100.0)
    } else {
        default_pass_percentage()
    }
}

fn deserialize_percentage<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(clamp_percentage(f64::deserialize(deserializer)?))
}

/// How a caller addresses a quiz: by surrogate id or public UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuizRef {
    Id(QuizId),
    Public(Uuid),
}

impl fmt::Display for QuizRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizRef::Id(id) => write!(f, "#{id}"),
            QuizRef::Public(uuid) => write!(f, "{uuid}"),
        }
    }
}

impl FromStr for QuizRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('#');
        if let Ok(id) = s.parse::<QuizId>() {
            return Ok(QuizRef::Id(id));
        }
        Uuid::parse_str(s)
            .map(QuizRef::Public)
            .map_err(|_| format!("invalid quiz reference: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Question
// ---------------------------------------------------------------------------

/// A question, owned by a quiz or sitting in the question bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    /// Owning quiz; `None` for question bank items.
    #[serde(default)]
    pub quiz_id: Option<QuizId>,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    #[serde(default)]
    pub prompt: String,
    /// Option labels, addressed by value when scoring.
    #[serde(default)]
    pub options: Vec<String>,
    /// Shape depends on the type; decoded by [`crate::answer::AnswerKey`].
    #[serde(default)]
    pub correct_answer: Value,
    #[serde(default = "default_points")]
    pub points: f64,
    #[serde(default)]
    pub metadata: QuestionMetadata,
    /// Presentation order; ties broken by `id`.
    #[serde(default)]
    pub question_order: i64,
}

fn default_points() -> f64 {
    1.0
}

impl Question {
    /// Points this question is worth. Negative or non-finite values count as 0.
    pub fn max_points(&self) -> f64 {
        if self.points.is_finite() && self.points > 0.0 {
            self.points
        } else {
            0.0
        }
    }
}

/// Type-specific auxiliary data. Malformed entries decode to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionMetadata {
    /// Expected per-blank strings for `fill_blank`.
    #[serde(default, deserialize_with = "lenient_list")]
    pub blanks: Vec<String>,
    /// Left → right pairs for `matching`.
    #[serde(default, deserialize_with = "lenient_pairs")]
    pub pairs: BTreeMap<String, String>,
    /// Canonical item order for `sequence`.
    #[serde(default, deserialize_with = "lenient_list")]
    pub order: Vec<String>,
}

/// A quiz together with its questions, as read from a quiz source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizBundle {
    pub quiz: Quiz,
    #[serde(default)]
    pub questions: Vec<Question>,
}

// ---------------------------------------------------------------------------
// Attempt
// ---------------------------------------------------------------------------

/// Coarse classification of an attempt's percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultTier {
    Low,
    Medium,
    High,
}

impl fmt::Display for ResultTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultTier::Low => write!(f, "low"),
            ResultTier::Medium => write!(f, "medium"),
            ResultTier::High => write!(f, "high"),
        }
    }
}

/// Denormalized learner details stored with an attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// One breakdown row per scored question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptAnswer {
    pub question_id: QuestionId,
    /// The answer exactly as submitted.
    pub answer: Value,
    pub is_correct: bool,
    pub points_awarded: f64,
}

/// A graded submission, ready for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// Opaque reference handed back to the learner.
    pub reference: Uuid,
    pub quiz_id: QuizId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub student: StudentInfo,
    pub obtained_marks: f64,
    pub total_marks: f64,
    pub percentage: f64,
    pub passed: bool,
    pub result_tier: ResultTier,
    /// Seconds the learner spent.
    #[serde(default)]
    pub time_taken: u64,
    /// Raw answers keyed by question id.
    #[serde(default)]
    pub answers: BTreeMap<QuestionId, Value>,
    #[serde(default)]
    pub breakdown: Vec<AttemptAnswer>,
    pub submitted_at: DateTime<Utc>,
}

/// An attempt after the store assigned it an identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedAttempt {
    pub id: AttemptId,
    #[serde(flatten)]
    pub attempt: Attempt,
}
