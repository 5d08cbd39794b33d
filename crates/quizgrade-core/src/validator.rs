//! Availability, access and attempt-limit gates.
//!
//! Every check is pure: the caller supplies the current time and the
//! attempt counts read from the store. Failures are returned as a
//! [`Verdict`] carrying a user-facing [`Rejection`], never as errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Quiz, UserId};

/// Why a learner may not start or submit an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Rejection {
    #[error("This quiz is not open yet. It opens at {opens_at}.")]
    NotYetOpen { opens_at: DateTime<Utc> },

    #[error("This quiz is closed. It closed at {closed_at}.")]
    Closed { closed_at: DateTime<Utc> },

    #[error("Maximum attempts reached: this quiz accepts at most {limit} submissions.")]
    TotalAttemptsReached { limit: u32 },

    #[error("Maximum attempts reached: you have used all {limit} attempts for this quiz.")]
    UserAttemptsReached { limit: u32 },

    #[error("You must be logged in to take this quiz.")]
    LoginRequired,

    #[error("This quiz is restricted to users with the '{role}' role.")]
    RoleRequired { role: String },
}

/// Outcome of a gate check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub allowed: bool,
    /// Present exactly when `allowed` is false.
    pub reason: Option<Rejection>,
}

impl Verdict {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn reject(reason: Rejection) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }

    /// Run `next` only if this verdict allows.
    pub fn and_then(self, next: impl FnOnce() -> Verdict) -> Verdict {
        if self.allowed {
            next()
        } else {
            self
        }
    }

    /// The user-facing reason text, empty when allowed.
    pub fn reason_text(&self) -> String {
        self.reason
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn into_result(self) -> Result<(), Rejection> {
        match self.reason {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }
}

/// Recorded attempts for a quiz, as read from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptCounts {
    /// Attempts across all users.
    pub total: u64,
    /// Attempts by the calling user; 0 for anonymous callers.
    pub user: u64,
}

/// Attempt ceilings in effect for a quiz; 0 means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptLimits {
    pub max_total: u32,
    pub max_per_user: u32,
}

impl AttemptLimits {
    pub fn for_quiz(quiz: &Quiz) -> Self {
        Self {
            max_total: quiz.max_total_attempts,
            max_per_user: quiz.effective_user_limit(),
        }
    }
}

/// The caller, as identified by the host platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Learner {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Learner {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            roles: Vec::new(),
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }
}

/// Check the quiz's scheduling window. Both bounds are inclusive.
pub fn validate_availability(quiz: &Quiz, now: DateTime<Utc>) -> Verdict {
    if let Some(opens_at) = quiz.scheduled_start {
        if now < opens_at {
            return Verdict::reject(Rejection::NotYetOpen { opens_at });
        }
    }
    if let Some(closed_at) = quiz.scheduled_end {
        if now > closed_at {
            return Verdict::reject(Rejection::Closed { closed_at });
        }
    }
    Verdict::allow()
}

/// Check the quiz's attempt ceilings against recorded counts.
pub fn validate_limits(quiz: &Quiz, user_id: Option<UserId>, counts: AttemptCounts) -> Verdict {
    check_limits(AttemptLimits::for_quiz(quiz), user_id, counts)
}

/// Ceiling check on explicit limits; stores call this under their write lock.
/// Anonymous callers are exempt from the per-user ceiling.
pub fn check_limits(limits: AttemptLimits, user_id: Option<UserId>, counts: AttemptCounts) -> Verdict {
    if limits.max_total > 0 && counts.total >= u64::from(limits.max_total) {
        return Verdict::reject(Rejection::TotalAttemptsReached {
            limit: limits.max_total,
        });
    }
    if limits.max_per_user > 0 && user_id.is_some() && counts.user >= u64::from(limits.max_per_user)
    {
        return Verdict::reject(Rejection::UserAttemptsReached {
            limit: limits.max_per_user,
        });
    }
    Verdict::allow()
}

/// Check login and role requirements. Role names compare case-insensitively.
pub fn validate_access(quiz: &Quiz, learner: &Learner) -> Verdict {
    let required_role = quiz
        .required_role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    if (quiz.require_login || required_role.is_some()) && learner.user_id.is_none() {
        return Verdict::reject(Rejection::LoginRequired);
    }
    if let Some(role) = required_role {
        let has_role = learner.roles.iter().any(|r| r.trim().eq_ignore_ascii_case(role));
        if !has_role {
            return Verdict::reject(Rejection::RoleRequired {
                role: role.to_string(),
            });
        }
    }
    Verdict::allow()
}
