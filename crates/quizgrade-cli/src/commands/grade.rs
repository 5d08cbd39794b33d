//! The `quizgrade grade` command.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, Table};

use quizgrade_core::model::{Attempt, QuizBundle};
use quizgrade_core::recorder::{assemble_attempt, Submission};

use super::{excerpt, load_quiz, read_answers};
use crate::Format;

pub fn execute(quiz_path: PathBuf, answers_path: PathBuf, format: Format) -> Result<()> {
    let bundle = load_quiz(&quiz_path)?;
    let answers = read_answers(&answers_path)?;

    let submission = Submission {
        answers,
        ..Default::default()
    };
    let attempt = assemble_attempt(&bundle, submission, Utc::now());

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&attempt)?),
        Format::Text => print_attempt(&bundle, &attempt),
    }

    Ok(())
}

/// Per-question table followed by the totals.
pub fn print_attempt(bundle: &QuizBundle, attempt: &Attempt) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Type", "Prompt", "Correct", "Points"]);

    for row in &attempt.breakdown {
        let question = bundle.questions.iter().find(|q| q.id == row.question_id);
        let max = question.map(|q| q.max_points()).unwrap_or_default();
        table.add_row(vec![
            Cell::new(row.question_id),
            Cell::new(question.map(|q| q.question_type.as_str()).unwrap_or("?")),
            Cell::new(question.map(|q| excerpt(&q.prompt, 40)).unwrap_or_default()),
            Cell::new(if row.is_correct { "yes" } else { "no" }),
            Cell::new(format!("{} / {}", row.points_awarded, max)),
        ]);
    }

    println!("Quiz #{}: {}", bundle.quiz.id, bundle.quiz.title);
    println!("{table}");
    println!(
        "Score: {} / {} ({}%)",
        attempt.obtained_marks, attempt.total_marks, attempt.percentage
    );
    println!(
        "Result: {} (tier: {})",
        if attempt.passed { "passed" } else { "not passed" },
        attempt.result_tier
    );
}
