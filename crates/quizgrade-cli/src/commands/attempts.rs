//! The `quizgrade attempts` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};
use serde_json::json;

use quizgrade_core::model::QuizRef;
use quizgrade_core::statistics::compute_attempt_stats;
use quizgrade_core::traits::{AttemptStore, QuizSource};
use quizgrade_store::{load_config_from, open_store};

use crate::Format;

pub async fn execute(
    quiz: String,
    user: Option<u64>,
    format: Option<Format>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let format = format.unwrap_or_else(|| config.output_format.into());
    let quiz_ref: QuizRef = quiz.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let store = open_store(&config.store).await?;
    let bundle = store
        .quizzes
        .load(&quiz_ref)
        .await?
        .ok_or_else(|| anyhow::anyhow!("quiz not found: {quiz_ref}"))?;

    let attempts = store.attempts.list(bundle.quiz.id, user).await?;
    let stats = compute_attempt_stats(&attempts);

    if format == Format::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "quiz_id": bundle.quiz.id,
                "attempts": attempts,
                "stats": stats,
            }))?
        );
        return Ok(());
    }

    println!("Quiz #{}: {}", bundle.quiz.id, bundle.quiz.title);
    if attempts.is_empty() {
        println!("No attempts recorded.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Id", "User", "Score", "%", "Passed", "Tier", "Submitted"]);
    for recorded in &attempts {
        let a = &recorded.attempt;
        table.add_row(vec![
            Cell::new(recorded.id),
            Cell::new(a.user_id.map_or_else(|| "anonymous".to_string(), |u| u.to_string())),
            Cell::new(format!("{} / {}", a.obtained_marks, a.total_marks)),
            Cell::new(a.percentage),
            Cell::new(if a.passed { "yes" } else { "no" }),
            Cell::new(a.result_tier),
            Cell::new(a.submitted_at.format("%Y-%m-%d %H:%M:%S")),
        ]);
    }
    println!("{table}");

    println!(
        "{} attempt(s), {} learner(s): mean {}%, best {}%, pass rate {:.0}%",
        stats.attempts,
        stats.learners,
        stats.mean_percentage,
        stats.best_percentage,
        stats.pass_rate * 100.0
    );
    let tiers: Vec<String> = stats
        .tiers
        .iter()
        .map(|(tier, count)| format!("{tier}: {count}"))
        .collect();
    println!("Tiers: {}", tiers.join(", "));

    Ok(())
}
