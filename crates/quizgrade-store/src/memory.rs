//! In-memory store.
//!
//! Holds quizzes and attempts in process memory. Used by tests and by
//! configurations that should not leave anything on disk.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use quizgrade_core::error::PersistError;
use quizgrade_core::model::{Attempt, AttemptId, QuizBundle, QuizId, QuizRef, RecordedAttempt, UserId};
use quizgrade_core::traits::{AttemptStore, QuizSource};
use quizgrade_core::validator::{check_limits, AttemptCounts, AttemptLimits};

use crate::error::StoreError;

/// A store that keeps everything in memory.
#[derive(Default)]
pub struct MemoryStore {
    quizzes: Mutex<BTreeMap<QuizId, QuizBundle>>,
    /// Attempts per quiz, in insertion order.
    attempts: Mutex<BTreeMap<QuizId, Vec<RecordedAttempt>>>,
    /// Number of successful writes.
    write_count: AtomicU32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn count(attempts: &[RecordedAttempt], user_id: Option<UserId>) -> AttemptCounts {
    AttemptCounts {
        total: attempts.len() as u64,
        user: user_id.map_or(0, |user| {
            attempts
                .iter()
                .filter(|r| r.attempt.user_id == Some(user))
                .count() as u64
        }),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given quizzes.
    pub fn with_quizzes(bundles: impl IntoIterator<Item = QuizBundle>) -> Result<Self, StoreError> {
        let store = Self::new();
        for bundle in bundles {
            store.insert_quiz(bundle)?;
        }
        Ok(store)
    }

    /// Add a quiz. Fails if its id is already taken.
    pub fn insert_quiz(&self, bundle: QuizBundle) -> Result<(), StoreError> {
        let mut quizzes = lock(&self.quizzes);
        if quizzes.contains_key(&bundle.quiz.id) {
            return Err(StoreError::DuplicateQuiz(bundle.quiz.id));
        }
        quizzes.insert(bundle.quiz.id, bundle);
        Ok(())
    }

    /// Number of attempts written so far.
    pub fn write_count(&self) -> u32 {
        self.write_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl QuizSource for MemoryStore {
    async fn load(&self, quiz: &QuizRef) -> anyhow::Result<Option<QuizBundle>> {
        Ok(lock(&self.quizzes)
            .values()
            .find(|b| b.quiz.matches(quiz))
            .cloned())
    }
}

#[async_trait]
impl AttemptStore for MemoryStore {
    async fn counts(&self, quiz_id: QuizId, user_id: Option<UserId>) -> anyhow::Result<AttemptCounts> {
        let attempts = lock(&self.attempts);
        Ok(attempts
            .get(&quiz_id)
            .map(|list| count(list, user_id))
            .unwrap_or_default())
    }

    async fn persist(&self, attempt: &Attempt, limits: AttemptLimits) -> Result<AttemptId, PersistError> {
        let mut attempts = lock(&self.attempts);
        let list = attempts.entry(attempt.quiz_id).or_default();

        check_limits(limits, attempt.user_id, count(list, attempt.user_id))
            .into_result()
            .map_err(PersistError::LimitReached)?;

        let id = list.last().map_or(1, |r| r.id + 1);
        list.push(RecordedAttempt {
            id,
            attempt: attempt.clone(),
        });
        self.write_count.fetch_add(1, Ordering::Relaxed);
        Ok(id)
    }

    async fn list(&self, quiz_id: QuizId, user_id: Option<UserId>) -> anyhow::Result<Vec<RecordedAttempt>> {
        let attempts = lock(&self.attempts);
        Ok(attempts
            .get(&quiz_id)
            .into_iter()
            .flatten()
            .filter(|r| user_id.is_none() || r.attempt.user_id == user_id)
            .cloned()
            .collect())
    }
}
