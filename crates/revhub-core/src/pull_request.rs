use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a pull request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestStatus {
    /// Newly created, reviewers may still change.
    #[default]
    Open,
    /// Terminal state.
    Merged,
}

impl PullRequestStatus {
    /// Returns the canonical lowercase string used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Merged => "merged",
        }
    }
}

/// Ledger record for one pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Caller-supplied, unique for the process lifetime.
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
    /// Never contains the author or duplicates.
    pub assigned_reviewers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Creates an open pull request stamped with the current time.
    #[must_use]
    pub fn open(
        pull_request_id: impl Into<String>,
        pull_request_name: impl Into<String>,
        author_id: impl Into<String>,
        assigned_reviewers: Vec<String>,
    ) -> Self {
        Self {
            pull_request_id: pull_request_id.into(),
            pull_request_name: pull_request_name.into(),
            author_id: author_id.into(),
            status: PullRequestStatus::Open,
            assigned_reviewers,
            created_at: Utc::now(),
            merged_at: None,
        }
    }

    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }

    #[must_use]
    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.assigned_reviewers.iter().any(|r| r == user_id)
    }

    /// Moves the pull request to `Merged`.
    ///
    /// Returns `false` when it was already merged; `merged_at` keeps the
    /// timestamp of the first merge.
    pub fn merge(&mut self) -> bool {
        if self.is_merged() {
            return false;
        }
        self.status = PullRequestStatus::Merged;
        self.merged_at = Some(Utc::now());
        true
    }

    /// Swaps `old` for `new` in place. Returns `false` if `old` is not assigned.
    pub fn replace_reviewer(&mut self, old: &str, new: impl Into<String>) -> bool {
        match self.assigned_reviewers.iter_mut().find(|r| r.as_str() == old) {
            Some(slot) => {
                *slot = new.into();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn short(&self) -> PullRequestShort {
        PullRequestShort {
            pull_request_id: self.pull_request_id.clone(),
            pull_request_name: self.pull_request_name.clone(),
            author_id: self.author_id.clone(),
            status: self.status,
        }
    }
}

/// Compact listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
}
