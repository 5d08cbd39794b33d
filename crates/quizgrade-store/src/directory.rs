//! Directory-backed store.
//!
//! Layout under the root:
//!
//! ```text
//! quizzes/                    quiz definition files (.toml or .json)
//! attempts/<quiz_id>/<id>.json  one record per attempt
//! ```
//!
//! Quiz definitions are cached after the first read. Every attempt write
//! goes through a single write lock, which also covers the ceiling
//! re-check, and drops the quiz cache so edited definitions are picked up.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::Mutex;

use quizgrade_core::error::PersistError;
use quizgrade_core::model::{Attempt, AttemptId, QuizBundle, QuizId, QuizRef, RecordedAttempt, UserId};
use quizgrade_core::parser::load_quiz_directory;
use quizgrade_core::traits::{AttemptStore, QuizSource};
use quizgrade_core::validator::{check_limits, AttemptCounts, AttemptLimits};

use crate::error::StoreError;

const QUIZZES_DIR: &str = "quizzes";
const ATTEMPTS_DIR: &str = "attempts";

/// A store rooted at a directory on disk.
pub struct DirectoryStore {
    root: PathBuf,
    write_lock: Mutex<()>,
    cache: RwLock<Option<Arc<Vec<QuizBundle>>>>,
}

impl DirectoryStore {
    /// Open a store, creating the directory layout if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if root.exists() && !root.is_dir() {
            return Err(StoreError::NotADirectory(root));
        }
        for dir in [root.join(QUIZZES_DIR), root.join(ATTEMPTS_DIR)] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| StoreError::io(&dir, e))?;
        }
        tracing::debug!("opened directory store at {}", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
            cache: RwLock::new(None),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn quizzes_dir(&self) -> PathBuf {
        self.root.join(QUIZZES_DIR)
    }

    fn attempts_dir(&self, quiz_id: QuizId) -> PathBuf {
        self.root.join(ATTEMPTS_DIR).join(quiz_id.to_string())
    }

    /// Drop cached quiz definitions.
    pub fn invalidate(&self) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// All quiz definitions, read from disk on a cache miss.
    pub async fn quizzes(&self) -> anyhow::Result<Arc<Vec<QuizBundle>>> {
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(cached) = cached {
            return Ok(cached);
        }

        let dir = self.quizzes_dir();
        let parsed = tokio::task::spawn_blocking(move || load_quiz_directory(&dir)).await??;
        for quiz in &parsed {
            for note in &quiz.notes {
                tracing::debug!("{}: {}", quiz.source.display(), note);
            }
        }

        let bundles = Arc::new(parsed.into_iter().map(|p| p.bundle).collect::<Vec<_>>());
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Some(bundles.clone());
        Ok(bundles)
    }

    /// Every readable attempt record for a quiz, ordered by id.
    async fn read_attempts(&self, quiz_id: QuizId) -> Result<AttemptFiles, StoreError> {
        let dir = self.attempts_dir(quiz_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AttemptFiles::default()),
            Err(e) => return Err(StoreError::io(&dir, e)),
        };

        let mut records = Vec::new();
        let mut highest_id = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&dir, e))?
        {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            // unreadable records still reserve their id
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<AttemptId>().ok())
            {
                highest_id = highest_id.max(id);
            }
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| StoreError::io(&path, e))?;
            match serde_json::from_slice::<RecordedAttempt>(&bytes) {
                Ok(record) => records.push(record),
                Err(source) => {
                    tracing::warn!("{}", StoreError::Corrupt { path, source });
                }
            }
        }

        records.sort_by_key(|r| r.id);
        Ok(AttemptFiles {
            records,
            highest_id,
        })
    }

    async fn write_record(&self, record: &RecordedAttempt) -> Result<(), StoreError> {
        let dir = self.attempts_dir(record.attempt.quiz_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;

        let path = dir.join(format!("{}.json", record.id));
        let tmp = dir.join(format!(".{}.json.tmp", record.id));
        let json = serde_json::to_vec_pretty(record).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })?;

        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::io(&path, e))
    }
}

#[derive(Default)]
struct AttemptFiles {
    records: Vec<RecordedAttempt>,
    highest_id: AttemptId,
}

fn count(records: &[RecordedAttempt], user_id: Option<UserId>) -> AttemptCounts {
    AttemptCounts {
        total: records.len() as u64,
        user: user_id.map_or(0, |user| {
            records
                .iter()
                .filter(|r| r.attempt.user_id == Some(user))
                .count() as u64
        }),
    }
}

#[async_trait]
impl QuizSource for DirectoryStore {
    async fn load(&self, quiz: &QuizRef) -> anyhow::Result<Option<QuizBundle>> {
        let quizzes = self.quizzes().await?;
        Ok(quizzes.iter().find(|b| b.quiz.matches(quiz)).cloned())
    }
}

#[async_trait]
impl AttemptStore for DirectoryStore {
    async fn counts(&self, quiz_id: QuizId, user_id: Option<UserId>) -> anyhow::Result<AttemptCounts> {
        let files = self.read_attempts(quiz_id).await?;
        Ok(count(&files.records, user_id))
    }

    async fn persist(&self, attempt: &Attempt, limits: AttemptLimits) -> Result<AttemptId, PersistError> {
        let _guard = self.write_lock.lock().await;

        let files = self
            .read_attempts(attempt.quiz_id)
            .await
            .map_err(anyhow::Error::from)?;
        check_limits(limits, attempt.user_id, count(&files.records, attempt.user_id))
            .into_result()
            .map_err(PersistError::LimitReached)?;

        let record = RecordedAttempt {
            id: files.highest_id + 1,
            attempt: attempt.clone(),
        };
        self.write_record(&record)
            .await
            .map_err(anyhow::Error::from)?;
        self.invalidate();

        tracing::debug!(
            quiz_id = attempt.quiz_id,
            attempt_id = record.id,
            "wrote attempt record"
        );
        Ok(record.id)
    }

    async fn list(&self, quiz_id: QuizId, user_id: Option<UserId>) -> anyhow::Result<Vec<RecordedAttempt>> {
        let mut records = self.read_attempts(quiz_id).await?.records;
        if user_id.is_some() {
            records.retain(|r| r.attempt.user_id == user_id);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quizgrade_core::recorder::{assemble_attempt, Submission};
    use quizgrade_core::validator::Rejection;

    const QUIZ: &str = r#"
[quiz]
id = 3
uuid = "0b7e4a52-5d0c-4c1e-8f0a-3c2b1a000003"
title = "Stored quiz"

[[questions]]
id = 1
type = "number"
correct_answer = 7
"#;

    async fn store_with_quiz() -> (tempfile::TempDir, DirectoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::open(dir.path()).await.unwrap();
        std::fs::write(store.quizzes_dir().join("stored.toml"), QUIZ).unwrap();
        (dir, store)
    }

    async fn attempt(store: &DirectoryStore, user_id: Option<UserId>) -> Attempt {
        let bundle = store.load(&QuizRef::Id(3)).await.unwrap().unwrap();
        let submission = Submission {
            user_id,
            answers: [(1, serde_json::json!(7))].into_iter().collect(),
            ..Default::default()
        };
        assemble_attempt(&bundle, submission, Utc::now())
    }

    #[tokio::test]
    async fn open_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        DirectoryStore::open(&root).await.unwrap();
        assert!(root.join("quizzes").is_dir());
        assert!(root.join("attempts").is_dir());
    }

    #[tokio::test]
    async fn open_rejects_file_root() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = DirectoryStore::open(file.path()).await.err().unwrap();
        assert!(matches!(err, StoreError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn loads_by_id_and_uuid() {
        let (_dir, store) = store_with_quiz().await;
        let by_uuid: QuizRef = "0b7e4a52-5d0c-4c1e-8f0a-3c2b1a000003".parse().unwrap();
        assert!(store.load(&by_uuid).await.unwrap().is_some());
        assert!(store.load(&QuizRef::Id(3)).await.unwrap().is_some());
        assert!(store.load(&QuizRef::Id(4)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn persist_writes_one_file_per_attempt() {
        let (dir, store) = store_with_quiz().await;
        let limits = AttemptLimits::default();

        let first = attempt(&store, Some(1)).await;
        assert_eq!(store.persist(&first, limits).await.unwrap(), 1);
        let second = attempt(&store, None).await;
        assert_eq!(store.persist(&second, limits).await.unwrap(), 2);

        assert!(dir.path().join("attempts/3/1.json").is_file());
        assert!(dir.path().join("attempts/3/2.json").is_file());

        let listed = store.list(3, None).await.unwrap();
        assert_eq!(listed.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(listed[0].attempt.reference, first.reference);
        assert_eq!(listed[0].attempt.obtained_marks, 1.0);
        assert_eq!(store.list(3, Some(1)).await.unwrap().len(), 1);
        assert_eq!(
            store.counts(3, Some(1)).await.unwrap(),
            AttemptCounts { total: 2, user: 1 }
        );
    }

    #[tokio::test]
    async fn persist_rechecks_total_ceiling() {
        let (_dir, store) = store_with_quiz().await;
        let limits = AttemptLimits {
            max_total: 1,
            max_per_user: 0,
        };
        let a = attempt(&store, Some(1)).await;
        store.persist(&a, limits).await.unwrap();
        let err = store.persist(&a, limits).await.unwrap_err();
        assert!(matches!(
            err,
            PersistError::LimitReached(Rejection::TotalAttemptsReached { limit: 1 })
        ));
        assert_eq!(store.list(3, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn write_drops_quiz_cache() {
        let (_dir, store) = store_with_quiz().await;
        assert_eq!(store.quizzes().await.unwrap().len(), 1);

        std::fs::write(
            store.quizzes_dir().join("second.toml"),
            "[quiz]\nid = 4\ntitle = \"Second\"\n",
        )
        .unwrap();
        // still cached
        assert_eq!(store.quizzes().await.unwrap().len(), 1);

        let a = attempt(&store, None).await;
        store.persist(&a, AttemptLimits::default()).await.unwrap();
        assert_eq!(store.quizzes().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn corrupt_records_are_skipped() {
        let (dir, store) = store_with_quiz().await;
        let a = attempt(&store, None).await;
        store.persist(&a, AttemptLimits::default()).await.unwrap();
        std::fs::write(dir.path().join("attempts/3/9.json"), "{not json").unwrap();

        assert_eq!(store.list(3, None).await.unwrap().len(), 1);
        let next = store.persist(&a, AttemptLimits::default()).await.unwrap();
        assert_eq!(next, 10);
    }

    #[tokio::test]
    async fn concurrent_submissions_respect_ceiling() {
        let (_dir, store) = store_with_quiz().await;
        let store = Arc::new(store);
        let a = attempt(&store, Some(8)).await;
        let limits = AttemptLimits {
            max_total: 0,
            max_per_user: 3,
        };

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                let a = a.clone();
                tokio::spawn(async move { store.persist(&a, limits).await.is_ok() })
            })
            .collect();

        let mut written = 0;
        for handle in handles {
            if handle.await.unwrap() {
                written += 1;
            }
        }
        assert_eq!(written, 3);
        assert_eq!(store.counts(3, Some(8)).await.unwrap().user, 3);
    }
}
