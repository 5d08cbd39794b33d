pub mod attempts;
pub mod grade;
pub mod init;
pub mod preview;
pub mod submit;
pub mod validate;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use quizgrade_core::model::{QuestionId, QuizBundle};
use quizgrade_core::parser::parse_quiz_file;

/// Read an answers file: a JSON object keyed by question id.
pub fn read_answers(path: &Path) -> Result<BTreeMap<QuestionId, Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("answers must be a JSON object keyed by question id: {}", path.display()))
}

/// Load one quiz file, logging anything normalized on the way in.
pub fn load_quiz(path: &Path) -> Result<QuizBundle> {
    let parsed = parse_quiz_file(path)?;
    for note in &parsed.notes {
        tracing::warn!("{}: {note}", path.display());
    }
    Ok(parsed.bundle)
}

/// Truncate long prompts for table cells.
pub fn excerpt(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
