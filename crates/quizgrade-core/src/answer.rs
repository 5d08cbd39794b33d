//! Typed answers and answer keys.
//!
//! Stored correct answers and submitted answers arrive as JSON-like values
//! whose shape depends on the question type. Both are decoded here, once,
//! so scoring can dispatch exhaustively on typed variants. Decoding never
//! fails: anything unusable becomes [`Answer::Absent`] or an empty key.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::model::{Question, QuestionType};

/// A submitted answer, decoded according to its question's type.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Nothing usable was submitted.
    Absent,
    /// A single value (choice label, free text, number, date).
    Scalar(String),
    /// An unordered selection (checkbox) or set of alternatives.
    StringList(Vec<String>),
    /// Position-significant values (blanks, sequence).
    OrderedList(Vec<String>),
    /// Left → right pairs (matching).
    KeyedPairs(BTreeMap<String, String>),
}

impl Answer {
    /// Decode a raw submitted value for a question of type `question_type`.
    pub fn decode(question_type: QuestionType, raw: &Value) -> Self {
        match question_type {
            QuestionType::Banner => Answer::Absent,
            QuestionType::Checkbox => match list_text(raw) {
                Some(items) if !items.is_empty() => Answer::StringList(items),
                _ => Answer::Absent,
            },
            QuestionType::FillBlank | QuestionType::Sequence => match list_text(raw) {
                Some(items) if items.iter().any(|s| !s.trim().is_empty()) => {
                    Answer::OrderedList(items)
                }
                _ => Answer::Absent,
            },
            QuestionType::Matching => match pairs_text(raw) {
                Some(pairs) if !pairs.is_empty() => Answer::KeyedPairs(pairs),
                _ => Answer::Absent,
            },
            QuestionType::Radio
            | QuestionType::Dropdown
            | QuestionType::Text
            | QuestionType::ShortText
            | QuestionType::Number
            | QuestionType::Date => match raw {
                Value::Array(_) => match list_text(raw) {
                    Some(items) if !items.is_empty() => Answer::StringList(items),
                    _ => Answer::Absent,
                },
                _ => match scalar_text(raw) {
                    Some(s) if !s.trim().is_empty() => Answer::Scalar(s),
                    _ => Answer::Absent,
                },
            },
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Answer::Absent)
    }

    /// The values of a list-shaped answer; a lone scalar counts as one item.
    fn items(&self) -> &[String] {
        match self {
            Answer::Scalar(s) => std::slice::from_ref(s),
            Answer::StringList(items) | Answer::OrderedList(items) => items,
            Answer::Absent | Answer::KeyedPairs(_) => &[],
        }
    }

    fn scalar(&self) -> Option<&str> {
        match self {
            Answer::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

/// The correct answer of a question, one variant per scoring rule.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerKey {
    /// Banner slides: nothing to answer.
    Informational,
    /// Radio/dropdown: any of these labels is correct.
    Choice(Vec<String>),
    /// Checkbox: the exact set of correct labels.
    Selection(BTreeSet<String>),
    /// Free text: acceptable strings, compared trimmed and case-insensitively.
    Text(Vec<String>),
    /// Numeric answers, compared with an absolute tolerance.
    Number(Vec<f64>),
    /// Dates, compared as trimmed strings.
    Date(Vec<String>),
    /// Expected per-blank strings.
    Blanks(Vec<String>),
    /// Left → right pairs.
    Pairs(BTreeMap<String, String>),
    /// Canonical item order.
    Sequence(Vec<String>),
}

impl AnswerKey {
    /// Decode a question's stored correct answer.
    pub fn for_question(question: &Question) -> Self {
        let raw = &question.correct_answer;
        match question.question_type {
            QuestionType::Banner => AnswerKey::Informational,
            QuestionType::Radio | QuestionType::Dropdown => {
                AnswerKey::Choice(choice_values(raw, &question.options))
            }
            QuestionType::Checkbox => AnswerKey::Selection(
                choice_values(raw, &question.options).into_iter().collect(),
            ),
            QuestionType::Text | QuestionType::ShortText => {
                AnswerKey::Text(scalar_or_list(raw))
            }
            QuestionType::Number => AnswerKey::Number(
                scalar_or_list(raw)
                    .iter()
                    .filter_map(|s| s.trim().parse::<f64>().ok())
                    .filter(|n| n.is_finite())
                    .collect(),
            ),
            QuestionType::Date => AnswerKey::Date(scalar_or_list(raw)),
            QuestionType::FillBlank => {
                let from_answer = list_text(raw).unwrap_or_default();
                if from_answer.is_empty() {
                    AnswerKey::Blanks(question.metadata.blanks.clone())
                } else {
                    AnswerKey::Blanks(from_answer)
                }
            }
            QuestionType::Matching => {
                if question.metadata.pairs.is_empty() {
                    AnswerKey::Pairs(pairs_text(raw).unwrap_or_default())
                } else {
                    AnswerKey::Pairs(question.metadata.pairs.clone())
                }
            }
            QuestionType::Sequence => {
                if question.metadata.order.is_empty() {
                    AnswerKey::Sequence(list_text(raw).unwrap_or_default())
                } else {
                    AnswerKey::Sequence(question.metadata.order.clone())
                }
            }
        }
    }

    /// Whether the key can ever award credit.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerKey::Informational => false,
            AnswerKey::Choice(v) | AnswerKey::Text(v) | AnswerKey::Date(v) => v.is_empty(),
            AnswerKey::Blanks(v) | AnswerKey::Sequence(v) => v.is_empty(),
            AnswerKey::Selection(set) => set.is_empty(),
            AnswerKey::Number(v) => v.is_empty(),
            AnswerKey::Pairs(p) => p.is_empty(),
        }
    }
}

/// Fraction of a question's points earned, plus all-or-nothing correctness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Credit {
    pub is_correct: bool,
    /// In `0.0..=1.0`.
    pub fraction: f64,
}

impl Credit {
    pub const FULL: Credit = Credit {
        is_correct: true,
        fraction: 1.0,
    };
    pub const NONE: Credit = Credit {
        is_correct: false,
        fraction: 0.0,
    };

    fn all_or_nothing(correct: bool) -> Self {
        if correct {
            Credit::FULL
        } else {
            Credit::NONE
        }
    }

    /// Partial credit for `hits` out of `total`; correct only when all hit.
    fn partial(hits: usize, total: usize) -> Self {
        if total == 0 {
            return Credit::NONE;
        }
        Credit {
            is_correct: hits == total,
            fraction: hits as f64 / total as f64,
        }
    }
}

/// Absolute tolerance for numeric answers.
pub const NUMBER_TOLERANCE: f64 = 0.01;

/// Grade a decoded answer against a decoded key.
pub fn grade(key: &AnswerKey, given: &Answer) -> Credit {
    if let AnswerKey::Informational = key {
        return Credit::FULL;
    }
    if given.is_absent() {
        return Credit::NONE;
    }

    match key {
        AnswerKey::Informational => Credit::FULL,
        AnswerKey::Choice(accepted) => Credit::all_or_nothing(
            given
                .scalar()
                .map(str::trim)
                .is_some_and(|g| accepted.iter().any(|a| a.trim() == g)),
        ),
        AnswerKey::Selection(correct) => grade_selection(correct, given.items()),
        AnswerKey::Text(accepted) => Credit::all_or_nothing(
            given
                .scalar()
                .is_some_and(|g| accepted.iter().any(|a| text_eq(a, g))),
        ),
        AnswerKey::Number(accepted) => Credit::all_or_nothing(
            given
                .scalar()
                .and_then(|g| g.trim().parse::<f64>().ok())
                .is_some_and(|g| accepted.iter().any(|a| (g - a).abs() < NUMBER_TOLERANCE)),
        ),
        AnswerKey::Date(accepted) => Credit::all_or_nothing(
            given
                .scalar()
                .map(str::trim)
                .is_some_and(|g| accepted.iter().any(|a| a.trim() == g)),
        ),
        AnswerKey::Blanks(expected) => {
            let given = given.items();
            let hits = expected
                .iter()
                .enumerate()
                .filter(|(i, e)| given.get(*i).is_some_and(|g| text_eq(e, g)))
                .count();
            Credit::partial(hits, expected.len())
        }
        AnswerKey::Pairs(expected) => {
            let Answer::KeyedPairs(chosen) = given else {
                return Credit::NONE;
            };
            let hits = expected
                .iter()
                .filter(|(left, right)| {
                    chosen
                        .get(left.as_str())
                        .is_some_and(|c| c.trim() == right.trim())
                })
                .count();
            Credit::partial(hits, expected.len())
        }
        AnswerKey::Sequence(order) => {
            let given = given.items();
            let hits = order
                .iter()
                .zip(given)
                .filter(|(o, g)| o.trim() == g.trim())
                .count();
            Credit::partial(hits, order.len())
        }
    }
}

/// Checkbox rule: exact set match earns full credit; otherwise each correct
/// pick earns and each wrong pick costs `1/|C|`, floored at zero.
fn grade_selection(correct: &BTreeSet<String>, picks: &[String]) -> Credit {
    let given: BTreeSet<&str> = picks
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    let correct_refs: BTreeSet<&str> = correct.iter().map(|s| s.trim()).collect();

    if given == correct_refs {
        return Credit::FULL;
    }
    if correct_refs.is_empty() {
        return Credit::NONE;
    }

    let hits = given.intersection(&correct_refs).count() as f64;
    let misses = given.difference(&correct_refs).count() as f64;
    let fraction = ((hits - misses) / correct_refs.len() as f64).max(0.0);

    Credit {
        is_correct: false,
        fraction: fraction.min(1.0),
    }
}

fn text_eq(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// JSON coercion helpers
// ---------------------------------------------------------------------------

/// Render a scalar JSON value as text. Arrays, objects and null yield `None`.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Render a list of scalars; a lone scalar becomes a one-item list.
/// Non-scalar items become empty strings so positions are preserved.
pub(crate) fn list_text(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .map(|v| scalar_text(v).unwrap_or_default())
                .collect(),
        ),
        Value::Null | Value::Object(_) => None,
        scalar => scalar_text(scalar).map(|s| vec![s]),
    }
}

/// Render an object of scalars as left → right pairs.
pub(crate) fn pairs_text(value: &Value) -> Option<BTreeMap<String, String>> {
    let Value::Object(map) = value else {
        return None;
    };
    Some(
        map.iter()
            .filter_map(|(k, v)| scalar_text(v).map(|v| (k.clone(), v)))
            .collect(),
    )
}

fn scalar_or_list(value: &Value) -> Vec<String> {
    list_text(value)
        .unwrap_or_default()
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Correct labels for a choice question. A JSON number that matches no
/// option label is read as a legacy positional index and mapped to the
/// label it points at, so correctness is always compared by value.
fn choice_values(raw: &Value, options: &[String]) -> Vec<String> {
    let resolve = |v: &Value| -> Option<String> {
        let text = scalar_text(v)?;
        if let Value::Number(n) = v {
            let is_label = options.iter().any(|o| o.trim() == text.trim());
            if !is_label {
                if let Some(label) = n
                    .as_u64()
                    .and_then(|idx| usize::try_from(idx).ok())
                    .and_then(|idx| options.get(idx))
                {
                    return Some(label.clone());
                }
            }
        }
        Some(text)
    };

    match raw {
        Value::Array(items) => items.iter().filter_map(resolve).collect(),
        Value::Object(_) | Value::Null => Vec::new(),
        scalar => resolve(scalar).into_iter().collect(),
    }
    .into_iter()
    .filter(|s| !s.trim().is_empty())
    .collect()
}

/// Rewrite a choice key that holds legacy option indices as the labels
/// they point at, so the key survives option reordering.
pub(crate) fn pin_choice_labels(question: &mut Question) {
    let has_number = match &question.correct_answer {
        Value::Number(_) => true,
        Value::Array(items) => items.iter().any(Value::is_number),
        _ => false,
    };
    if !has_number {
        return;
    }

    let labels = choice_values(&question.correct_answer, &question.options);
    question.correct_answer = match (question.question_type, labels.as_slice()) {
        (QuestionType::Checkbox, _) => Value::from(labels),
        (_, [label]) => Value::String(label.clone()),
        _ => Value::from(labels),
    };
}

/// Deserialize a list of strings, degrading to empty on malformed input.
pub(crate) fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(_) => list_text(&value).unwrap_or_default(),
        _ => Vec::new(),
    })
}

/// Deserialize a string map, degrading to empty on malformed input.
pub(crate) fn lenient_pairs<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(pairs_text(&value).unwrap_or_default())
}
