//! The `quizgrade validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizgrade_core::parser::{lint_quiz, load_quiz_directory, parse_quiz_file};

pub fn execute(quiz_path: PathBuf) -> Result<()> {
    let quizzes = if quiz_path.is_dir() {
        load_quiz_directory(&quiz_path)?
    } else {
        vec![parse_quiz_file(&quiz_path)?]
    };

    let mut total_warnings = 0;

    for parsed in &quizzes {
        let quiz = &parsed.bundle.quiz;
        println!(
            "Quiz #{}: {} ({} questions)",
            quiz.id,
            quiz.title,
            parsed.bundle.questions.len()
        );

        let warnings = lint_quiz(parsed);
        for w in &warnings {
            let prefix = w
                .question_id
                .map(|id| format!("  [q{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if quizzes.is_empty() {
        println!("No quiz files found.");
    } else if total_warnings == 0 {
        println!("All quizzes valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
