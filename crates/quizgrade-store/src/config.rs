//! Configuration and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizgrade_core::model::QuizBundle;
use quizgrade_core::parser::load_quiz_directory;
use quizgrade_core::recorder::AttemptRecorder;
use quizgrade_core::traits::{AttemptStore, QuizSource};

use crate::directory::DirectoryStore;
use crate::memory::MemoryStore;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "QUIZGRADE_DATA_DIR";

/// Where quizzes and attempts live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Directory {
        #[serde(default = "default_data_dir")]
        path: String,
    },
    Memory {
        /// Quiz files to load at startup.
        #[serde(default)]
        seed_dir: Option<String>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Directory {
            path: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "${HOME}/.quizgrade".to_string()
}

/// Preferred output format for CLI reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Top-level quizgrade configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizgradeConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables resolve to the empty string.
pub fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + len];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Directory { path } => StoreConfig::Directory {
            path: resolve_env_vars(path),
        },
        StoreConfig::Memory { seed_dir } => StoreConfig::Memory {
            seed_dir: seed_dir.as_deref().map(resolve_env_vars),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizgrade.toml` in the current directory
/// 2. `~/.config/quizgrade/config.toml`
///
/// `QUIZGRADE_DATA_DIR` forces a directory store at that path.
pub fn load_config() -> Result<QuizgradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizgradeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizgrade.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizgradeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizgradeConfig::default(),
    };

    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            config.store = StoreConfig::Directory { path: dir };
        }
    }

    config.store = resolve_store_config(&config.store);
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizgrade"))
}

/// An opened store, seen through both collaborator traits.
#[derive(Clone)]
pub struct Store {
    pub quizzes: Arc<dyn QuizSource>,
    pub attempts: Arc<dyn AttemptStore>,
}

impl Store {
    /// A recorder writing to this store.
    pub fn recorder(&self) -> AttemptRecorder {
        AttemptRecorder::new(self.quizzes.clone(), self.attempts.clone())
    }
}

/// Open the store described by `config`.
pub async fn open_store(config: &StoreConfig) -> Result<Store> {
    match config {
        StoreConfig::Directory { path } => {
            let store = Arc::new(
                DirectoryStore::open(path)
                    .await
                    .with_context(|| format!("failed to open store at {path}"))?,
            );
            Ok(Store {
                quizzes: store.clone(),
                attempts: store,
            })
        }
        StoreConfig::Memory { seed_dir } => {
            let bundles: Vec<QuizBundle> = match seed_dir {
                Some(dir) => load_quiz_directory(Path::new(dir))?
                    .into_iter()
                    .map(|parsed| parsed.bundle)
                    .collect(),
                None => Vec::new(),
            };
            let store = Arc::new(MemoryStore::with_quizzes(bundles)?);
            Ok(Store {
                quizzes: store.clone(),
                attempts: store,
            })
        }
    }
}
