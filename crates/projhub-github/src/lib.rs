//! GitHub pass-through
//!
//! A thin, read-only client for the public GitHub REST API. Responses are
//! trimmed to the handful of fields the dashboard displays and bounded to a
//! fixed page size. Non-200 upstream answers are reported with their status
//! so the HTTP layer can surface them unchanged.

mod client;

pub use client::{
    CommitSummary, GithubClient, IssueDigest, IssueRecord, RepoSummary, UserProfile,
    COMMIT_LIMIT, ISSUE_LIMIT, ISSUE_SCAN_LIMIT,
};

use thiserror::Error;

/// GitHub client errors
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub API returned status {status}")]
    Status { status: u16 },

    #[error("GitHub API request timed out")]
    Timeout,

    #[error("GitHub API request failed: {0}")]
    Transport(String),

    #[error("Unexpected GitHub API payload: {0}")]
    Decode(String),

    #[error("Invalid repository path: {0}")]
    InvalidRepository(String),

    #[error("Invalid GitHub username: {0}")]
    InvalidUsername(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for GithubError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GithubError::Timeout
        } else if err.is_decode() {
            GithubError::Decode(err.to_string())
        } else {
            GithubError::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, GithubError>;

/// Reduce whatever the user pasted to `owner/repo`.
///
/// Accepts a bare `owner/repo`, or a `http(s)://github.com/owner/repo` URL,
/// with or without a trailing `.git` or slash. Routers may collapse the
/// double slash after the scheme, so `https:/github.com/...` is accepted too.
pub fn normalize_repo(raw: &str) -> Result<String> {
    let mut repo = raw.trim().trim_start_matches('/');

    for prefix in ["https://", "http://", "https:/", "http:/"] {
        if let Some(rest) = repo.strip_prefix(prefix) {
            repo = rest;
            break;
        }
    }
    repo = repo.strip_prefix("github.com/").unwrap_or(repo);
    repo = repo.trim_end_matches('/');
    repo = repo.strip_suffix(".git").unwrap_or(repo);

    let segments: Vec<&str> = repo.split('/').collect();
    let valid = segments.len() == 2 && segments.iter().all(|s| is_valid_segment(s));
    if !valid {
        return Err(GithubError::InvalidRepository(raw.to_string()));
    }

    Ok(repo.to_string())
}

/// Validate a GitHub login before it is placed in a URL path
pub fn validate_username(username: &str) -> Result<&str> {
    let valid = !username.is_empty()
        && username.len() <= 39
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(username)
    } else {
        Err(GithubError::InvalidUsername(username.to_string()))
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
