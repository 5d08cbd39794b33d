//! quizgrade CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(name = "quizgrade", version, about = "Quiz scoring and attempt validation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Report format for command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

impl From<quizgrade_store::OutputFormat> for Format {
    fn from(format: quizgrade_store::OutputFormat) -> Self {
        match format {
            quizgrade_store::OutputFormat::Text => Format::Text,
            quizgrade_store::OutputFormat::Json => Format::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and example quiz
    Init,

    /// Parse and lint quiz files
    Validate {
        /// Path to quiz file or directory
        #[arg(long)]
        quiz: PathBuf,
    },

    /// Score answers against a quiz file without recording anything
    Grade {
        /// Path to quiz file
        #[arg(long)]
        quiz: PathBuf,

        /// JSON file of answers keyed by question id
        #[arg(long)]
        answers: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Show the question order a learner would see
    Preview {
        /// Path to quiz file
        #[arg(long)]
        quiz: PathBuf,

        /// Seed for a reproducible shuffle
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Gate, score and record a submission in the configured store
    Submit {
        /// Quiz id or public UUID
        #[arg(long)]
        quiz: String,

        /// JSON file of answers keyed by question id
        #[arg(long)]
        answers: PathBuf,

        /// Submitting user id (omit for anonymous)
        #[arg(long)]
        user: Option<u64>,

        /// Roles held by the submitting user
        #[arg(long = "role")]
        roles: Vec<String>,

        /// Seconds spent on the attempt
        #[arg(long, default_value = "0")]
        time_taken: u64,

        /// Output format (defaults to the config's output_format)
        #[arg(long, value_enum)]
        format: Option<Format>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List recorded attempts for a quiz
    Attempts {
        /// Quiz id or public UUID
        #[arg(long)]
        quiz: String,

        /// Only this user's attempts
        #[arg(long)]
        user: Option<u64>,

        /// Output format (defaults to the config's output_format)
        #[arg(long, value_enum)]
        format: Option<Format>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizgrade=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { quiz } => commands::validate::execute(quiz),
        Commands::Grade {
            quiz,
            answers,
            format,
        } => commands::grade::execute(quiz, answers, format),
        Commands::Preview { quiz, seed } => commands::preview::execute(quiz, seed),
        Commands::Submit {
            quiz,
            answers,
            user,
            roles,
            time_taken,
            format,
            config,
        } => {
            commands::submit::execute(quiz, answers, user, roles, time_taken, format, config).await
        }
        Commands::Attempts {
            quiz,
            user,
            format,
            config,
        } => commands::attempts::execute(quiz, user, format, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
