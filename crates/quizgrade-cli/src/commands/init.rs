//! The `quizgrade init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("quizgrade.toml").exists() {
        println!("quizgrade.toml already exists, skipping.");
    } else {
        std::fs::write("quizgrade.toml", SAMPLE_CONFIG)?;
        println!("Created quizgrade.toml");
    }

    std::fs::create_dir_all("quizzes")?;
    let example_path = std::path::Path::new("quizzes/example.toml");
    if example_path.exists() {
        println!("quizzes/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_QUIZ)?;
        println!("Created quizzes/example.toml");
    }

    std::fs::create_dir_all("answers")?;
    let answers_path = std::path::Path::new("answers/example.json");
    if !answers_path.exists() {
        std::fs::write(answers_path, EXAMPLE_ANSWERS)?;
        println!("Created answers/example.json");
    }

    println!("\nNext steps:");
    println!("  1. Run: quizgrade validate --quiz quizzes/example.toml");
    println!("  2. Run: quizgrade grade --quiz quizzes/example.toml --answers answers/example.json");
    println!("  3. Run: quizgrade submit --quiz 1 --answers answers/example.json --user 1");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizgrade configuration

# Quizzes are read from <path>/quizzes, attempts written to <path>/attempts.
[store]
type = "directory"
path = "."

output_format = "text"
"#;

const EXAMPLE_QUIZ: &str = r#"[quiz]
id = 1
title = "Example quiz"
description = "A short quiz to get started"
pass_percentage = 60
max_user_attempts = 3
randomize_answers = true

[[questions]]
id = 1
type = "radio"
prompt = "Which planet is closest to the sun?"
options = ["Venus", "Mercury", "Mars"]
correct_answer = "Mercury"
points = 2

[[questions]]
id = 2
type = "checkbox"
prompt = "Which of these are primary colours?"
options = ["Red", "Green", "Blue", "Yellow"]
correct_answer = ["Red", "Blue", "Yellow"]
points = 3

[[questions]]
id = 3
type = "number"
prompt = "How many continents are there?"
correct_answer = 7

[[questions]]
id = 4
type = "sequence"
prompt = "Order these from smallest to largest"
options = ["Moon", "Earth", "Sun"]

[questions.metadata]
order = ["Moon", "Earth", "Sun"]
"#;

const EXAMPLE_ANSWERS: &str = r#"{
  "1": "Mercury",
  "2": ["Red", "Blue"],
  "3": 7,
  "4": ["Moon", "Earth", "Sun"]
}
"#;
