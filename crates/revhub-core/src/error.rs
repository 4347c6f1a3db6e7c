use thiserror::Error;

/// Coarse classification used by the gateway to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or incomplete input.
    Validation,
    /// Uniqueness or state rule violated by an otherwise valid request.
    Conflict,
    /// A referenced entity does not exist (or is not eligible).
    Reference,
    /// Unexpected fault inside the service.
    Internal,
}

/// Canonical error type for registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A team with the same name is already registered.
    #[error("team `{team_name}` already exists")]
    DuplicateTeam {
        /// Conflicting team name.
        team_name: String,
    },

    /// Two members of one registration request share a user id.
    #[error("member `{user_id}` is listed more than once in team `{team_name}`")]
    DuplicateMember {
        /// Team being registered.
        team_name: String,
        /// Repeated user id.
        user_id: String,
    },

    /// A pull request with the same id is already in the ledger.
    #[error("pull request `{pull_request_id}` already exists")]
    DuplicateId {
        /// Conflicting pull request id.
        pull_request_id: String,
    },

    /// Author is not an active member of any registered team.
    #[error("author `{author_id}` is not an active team member")]
    UnknownAuthor {
        /// Rejected author id.
        author_id: String,
    },

    #[error("team `{team_name}` was not found")]
    TeamNotFound { team_name: String },

    #[error("user `{user_id}` was not found")]
    UserNotFound { user_id: String },

    #[error("pull request `{pull_request_id}` was not found")]
    PullRequestNotFound { pull_request_id: String },

    /// Reviewers of a merged pull request are frozen.
    #[error("pull request `{pull_request_id}` is already merged")]
    PullRequestMerged { pull_request_id: String },

    #[error("user `{user_id}` is not a reviewer of pull request `{pull_request_id}`")]
    ReviewerNotAssigned {
        pull_request_id: String,
        user_id: String,
    },

    /// No active teammate is left to take over a review.
    #[error("no active replacement candidate for pull request `{pull_request_id}`")]
    NoCandidate { pull_request_id: String },

    /// Validation error for input data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unexpected internal error occurred.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable details for debugging purposes.
        message: String,
    },
}

impl CoreError {
    /// Machine-readable code rendered in the `error` field of responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DuplicateTeam { .. } => "duplicate_team",
            Self::DuplicateMember { .. } => "duplicate_member",
            Self::DuplicateId { .. } => "duplicate_id",
            Self::UnknownAuthor { .. } => "unknown_author",
            Self::TeamNotFound { .. } => "team_not_found",
            Self::UserNotFound { .. } => "user_not_found",
            Self::PullRequestNotFound { .. } => "pull_request_not_found",
            Self::PullRequestMerged { .. } => "pull_request_merged",
            Self::ReviewerNotAssigned { .. } => "reviewer_not_assigned",
            Self::NoCandidate { .. } => "no_candidate",
            Self::Validation(_) => "validation_error",
            Self::Internal { .. } => "internal_error",
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateTeam { .. }
            | Self::DuplicateMember { .. }
            | Self::DuplicateId { .. }
            | Self::PullRequestMerged { .. }
            | Self::ReviewerNotAssigned { .. }
            | Self::NoCandidate { .. } => ErrorKind::Conflict,
            Self::UnknownAuthor { .. }
            | Self::TeamNotFound { .. }
            | Self::UserNotFound { .. }
            | Self::PullRequestNotFound { .. } => ErrorKind::Reference,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Creates a `Validation` variant.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an `Internal` variant.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Convenient result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
