//! The `quizgrade preview` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizgrade_core::randomizer::{present_random, present_seeded};

use super::{excerpt, load_quiz};

pub fn execute(quiz_path: PathBuf, seed: Option<u64>) -> Result<()> {
    let bundle = load_quiz(&quiz_path)?;
    let (seed, presented) = match seed {
        Some(seed) => (seed, present_seeded(&bundle.quiz, &bundle.questions, seed)),
        None => present_random(&bundle.quiz, &bundle.questions),
    };

    let mut table = Table::new();
    table.set_header(vec!["Pos", "#", "Type", "Prompt", "Options"]);
    for (pos, q) in presented.iter().enumerate() {
        table.add_row(vec![
            Cell::new(pos + 1),
            Cell::new(q.id),
            Cell::new(q.question_type),
            Cell::new(excerpt(&q.prompt, 40)),
            Cell::new(q.options.join(", ")),
        ]);
    }

    println!("Quiz #{}: {} (seed {seed})", bundle.quiz.id, bundle.quiz.title);
    println!("{table}");
    if !bundle.quiz.randomize_questions && !bundle.quiz.randomize_answers {
        println!("Randomization is off; this is the canonical order.");
    }

    Ok(())
}
