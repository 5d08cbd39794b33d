//! Quiz definition file parser.
//!
//! Loads quizzes from TOML or JSON files and directories, and lints them.
//! Stored content is never rejected for being odd: unknown type tags fall
//! back to `radio` and out-of-range pass bars are clamped, but both are
//! reported as notes so authors can fix them.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::answer::AnswerKey;
use crate::model::{
    clamp_percentage, default_pass_percentage, normalize_type, Question, QuestionId,
    QuestionType, Quiz, QuizBundle,
};

/// Intermediate structure for quiz definition files.
#[derive(Debug, Deserialize)]
struct RawQuizFile {
    quiz: RawQuiz,
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

/// The quiz table, with the pass bar captured before clamping.
#[derive(Debug, Deserialize)]
struct RawQuiz {
    #[serde(default)]
    pass_percentage: Option<f64>,
    #[serde(flatten)]
    quiz: Quiz,
}

/// A question, with the type tag captured before normalization.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(rename = "type", default)]
    type_tag: Option<String>,
    #[serde(flatten)]
    question: Question,
}

/// A quiz loaded from disk, with anything normalized on the way in.
#[derive(Debug, Clone)]
pub struct ParsedQuiz {
    pub bundle: QuizBundle,
    pub source: PathBuf,
    /// Values that were rewritten while loading.
    pub notes: Vec<ValidationWarning>,
}

/// A warning from quiz linting.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// The question concerned, if any.
    pub question_id: Option<QuestionId>,
    pub message: String,
}

impl ValidationWarning {
    fn quiz(message: impl Into<String>) -> Self {
        Self {
            question_id: None,
            message: message.into(),
        }
    }

    fn question(id: QuestionId, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(id),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.question_id {
            Some(id) => write!(f, "question {id}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn is_quiz_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml") || ext.eq_ignore_ascii_case("json"))
}

/// Parse a single quiz file. The format follows the extension: `.json` is
/// JSON, anything else is TOML.
pub fn parse_quiz_file(path: &Path) -> Result<ParsedQuiz> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read quiz file: {}", path.display()))?;

    parse_quiz_str(&content, path)
}

/// Parse quiz file contents; `source_path` picks the format and labels errors.
pub fn parse_quiz_str(content: &str, source_path: &Path) -> Result<ParsedQuiz> {
    let raw: RawQuizFile = if is_json(source_path) {
        serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?
    } else {
        toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?
    };

    let mut notes = Vec::new();

    let mut quiz = raw.quiz.quiz;
    let pass = raw.quiz.pass_percentage.unwrap_or_else(default_pass_percentage);
    quiz.pass_percentage = clamp_percentage(pass);
    if quiz.pass_percentage != pass {
        notes.push(ValidationWarning::quiz(format!(
            "pass_percentage {pass} is out of range, using {}",
            quiz.pass_percentage
        )));
    }

    let questions = raw
        .questions
        .into_iter()
        .map(|RawQuestion { type_tag, mut question }| {
            if let Some(tag) = type_tag {
                question.question_type = normalize_type(&tag);
                if tag.parse::<QuestionType>().is_err() {
                    notes.push(ValidationWarning::question(
                        question.id,
                        format!("unknown question type '{tag}', treated as radio"),
                    ));
                }
            }
            question.quiz_id = question.quiz_id.or(Some(quiz.id));
            question
        })
        .collect();

    Ok(ParsedQuiz {
        bundle: QuizBundle { quiz, questions },
        source: source_path.to_path_buf(),
        notes,
    })
}

/// Recursively load every `.toml` and `.json` quiz file under `dir`.
/// Files that fail to parse are skipped with a warning.
pub fn load_quiz_directory(dir: &Path) -> Result<Vec<ParsedQuiz>> {
    let mut quizzes = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            quizzes.extend(load_quiz_directory(&path)?);
        } else if is_quiz_file(&path) {
            match parse_quiz_file(&path) {
                Ok(quiz) => quizzes.push(quiz),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(quizzes)
}

/// Lint a parsed quiz. Includes the notes recorded while loading.
pub fn lint_quiz(parsed: &ParsedQuiz) -> Vec<ValidationWarning> {
    let mut warnings = parsed.notes.clone();
    let quiz = &parsed.bundle.quiz;
    let questions = &parsed.bundle.questions;

    if let (Some(start), Some(end)) = (quiz.scheduled_start, quiz.scheduled_end) {
        if end < start {
            warnings.push(ValidationWarning::quiz(format!(
                "scheduled_end {end} is before scheduled_start {start}; the quiz can never open"
            )));
        }
    }

    let mut seen_ids = HashSet::new();
    for question in questions {
        if !seen_ids.insert(question.id) {
            warnings.push(ValidationWarning::question(
                question.id,
                format!("duplicate question id: {}", question.id),
            ));
        }
    }

    for question in questions {
        if question.quiz_id != Some(quiz.id) {
            warnings.push(ValidationWarning::question(
                question.id,
                "belongs to a different quiz and will still be scored here",
            ));
        }
        lint_question(question, &mut warnings);
    }

    let total: f64 = questions.iter().map(Question::max_points).sum();
    if total <= 0.0 {
        warnings.push(ValidationWarning::quiz(
            "quiz has no scorable points; every attempt will classify as medium",
        ));
    }

    warnings
}

fn lint_question(question: &Question, warnings: &mut Vec<ValidationWarning>) {
    if question.points < 0.0 || !question.points.is_finite() {
        warnings.push(ValidationWarning::question(
            question.id,
            format!("points {} counts as 0", question.points),
        ));
    }

    let key = AnswerKey::for_question(question);
    match &key {
        AnswerKey::Choice(labels) => {
            if question.options.is_empty() {
                warnings.push(ValidationWarning::question(question.id, "has no options"));
            }
            for label in labels.iter().filter(|l| !question.options.contains(l)) {
                warnings.push(ValidationWarning::question(
                    question.id,
                    format!("correct answer '{label}' is not one of the options"),
                ));
            }
        }
        AnswerKey::Selection(labels) => {
            for label in labels.iter().filter(|l| !question.options.contains(l)) {
                warnings.push(ValidationWarning::question(
                    question.id,
                    format!("correct answer '{label}' is not one of the options"),
                ));
            }
        }
        _ => {}
    }

    if key.is_empty() {
        let message = match question.question_type {
            QuestionType::FillBlank => "has no blanks; it can never be answered correctly",
            QuestionType::Matching => "has no pairs; it can never be answered correctly",
            QuestionType::Sequence => "has no order; it can never be answered correctly",
            _ => "has no correct answer; it can never be answered correctly",
        };
        warnings.push(ValidationWarning::question(question.id, message));
    }
}
