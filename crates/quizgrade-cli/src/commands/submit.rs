//! The `quizgrade submit` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::json;

use quizgrade_core::model::QuizRef;
use quizgrade_core::recorder::{SubmitOutcome, Submission};
use quizgrade_core::traits::QuizSource;
use quizgrade_store::{load_config_from, open_store};

use super::grade::print_attempt;
use super::read_answers;
use crate::Format;

pub async fn execute(
    quiz: String,
    answers_path: PathBuf,
    user: Option<u64>,
    roles: Vec<String>,
    time_taken: u64,
    format: Option<Format>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let format = format.unwrap_or_else(|| config.output_format.into());
    let quiz_ref: QuizRef = quiz.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let submission = Submission {
        user_id: user,
        roles,
        time_taken,
        answers: read_answers(&answers_path)?,
        ..Default::default()
    };

    let store = open_store(&config.store).await?;
    let outcome = store
        .recorder()
        .submit(&quiz_ref, submission)
        .await
        .with_context(|| format!("failed to submit to quiz {quiz_ref}"))?;

    match outcome {
        SubmitOutcome::Recorded(recorded) => match format {
            Format::Json => println!("{}", serde_json::to_string_pretty(&recorded)?),
            Format::Text => {
                let bundle = store
                    .quizzes
                    .load(&quiz_ref)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("quiz {quiz_ref} disappeared after recording"))?;
                println!("Recorded attempt {} ({})", recorded.id, recorded.attempt.reference);
                print_attempt(&bundle, &recorded.attempt);
            }
        },
        SubmitOutcome::Rejected(rejection) => {
            match format {
                Format::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "rejected": rejection,
                        "message": rejection.to_string(),
                    }))?
                ),
                Format::Text => println!("Rejected: {rejection}"),
            }
            anyhow::bail!("submission was not recorded");
        }
    }

    Ok(())
}
