//! GitHub REST client
//!
//! Author: projhub maintainers

use projhub_core::GithubConfig;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::{normalize_repo, validate_username, GithubError, Result};

/// Commits returned per repository
pub const COMMIT_LIMIT: usize = 10;
/// Open items inspected when splitting issues from pull requests
pub const ISSUE_SCAN_LIMIT: usize = 20;
/// Issues and pull requests returned, each
pub const ISSUE_LIMIT: usize = 5;

// ============================================================================
// Response models
// ============================================================================

/// One commit as shown on a project page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub date: String,
}

/// An open issue or pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: Option<i64>,
    pub number: Option<i64>,
    pub title: Option<String>,
    pub user: Option<String>,
    pub url: Option<String>,
    pub created_at: Option<String>,
}

/// Open issues and pull requests of a repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDigest {
    pub issues: Vec<IssueRecord>,
    pub pull_requests: Vec<IssueRecord>,
}

/// Public profile of a GitHub account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub name: Option<String>,
    pub public_repos: u64,
    pub followers: u64,
}

/// Repository entry of a user listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    pub stars: u64,
    pub language: Option<String>,
}

// Upstream shapes. Every field is defaulted: GitHub payloads are treated as
// display data and malformed entries are skipped rather than failing the call.

#[derive(Debug, Deserialize)]
struct RawCommit {
    #[serde(default)]
    sha: String,
    commit: RawCommitDetail,
}

#[derive(Debug, Deserialize)]
struct RawCommitDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    author: Option<RawCommitAuthor>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCommitAuthor {
    #[serde(default)]
    name: String,
    #[serde(default)]
    date: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
    name: Option<String>,
    #[serde(default)]
    public_repos: u64,
    #[serde(default)]
    followers: u64,
}

#[derive(Debug, Deserialize)]
struct RawRepo {
    name: String,
    #[serde(default)]
    stargazers_count: u64,
    language: Option<String>,
}

/// Decode each array element independently, dropping the ones that do not fit
fn decode_items<T: for<'de> Deserialize<'de>>(body: Value, limit: usize) -> Vec<T> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .take(limit)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Read one issue object field by field; ill-typed fields become `None`
fn issue_record(item: &Map<String, Value>) -> IssueRecord {
    let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);

    IssueRecord {
        id: item.get("id").and_then(Value::as_i64),
        number: item.get("number").and_then(Value::as_i64),
        title: text("title"),
        user: item
            .get("user")
            .and_then(|user| user.get("login"))
            .and_then(Value::as_str)
            .map(str::to_string),
        url: text("html_url"),
        created_at: text("created_at"),
    }
}

// ============================================================================
// Client
// ============================================================================

/// GitHub API client
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl GithubClient {
    /// Create from config
    pub fn from_config(config: &GithubConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GithubError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Point the client at another API root (GitHub Enterprise, test servers)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .get(&url)
            .query(query)
            .header(header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "GitHub request failed");
            GithubError::from(e)
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(url = %url, status = status.as_u16(), "GitHub returned non-200");
            return Err(GithubError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.json::<Value>().await?)
    }

    /// Most recent commits of `repo`, newest first
    pub async fn recent_commits(&self, repo: &str) -> Result<Vec<CommitSummary>> {
        let repo = normalize_repo(repo)?;
        let per_page = COMMIT_LIMIT.to_string();
        let body = self
            .get_json(&format!("/repos/{repo}/commits"), &[("per_page", &per_page)])
            .await?;

        let commits = decode_items::<RawCommit>(body, COMMIT_LIMIT)
            .into_iter()
            .map(|c| {
                let author = c.commit.author.unwrap_or_default();
                CommitSummary {
                    sha: c.sha,
                    message: c.commit.message,
                    author: author.name,
                    date: author.date,
                }
            })
            .collect();

        Ok(commits)
    }

    /// Open issues and pull requests of `repo`.
    ///
    /// GitHub lists pull requests on the issues endpoint; they are told apart
    /// by the presence of a `pull_request` key.
    pub async fn open_issues(&self, repo: &str) -> Result<IssueDigest> {
        let repo = normalize_repo(repo)?;
        let per_page = ISSUE_SCAN_LIMIT.to_string();
        let body = self
            .get_json(
                &format!("/repos/{repo}/issues"),
                &[("state", "open"), ("per_page", &per_page)],
            )
            .await?;

        let items = match body {
            Value::Array(items) => items,
            _ => Vec::new(),
        };

        let mut digest = IssueDigest::default();
        for item in items.iter().take(ISSUE_SCAN_LIMIT) {
            let Value::Object(fields) = item else {
                continue;
            };
            let record = issue_record(fields);
            if fields.contains_key("pull_request") {
                digest.pull_requests.push(record);
            } else {
                digest.issues.push(record);
            }
        }
        digest.issues.truncate(ISSUE_LIMIT);
        digest.pull_requests.truncate(ISSUE_LIMIT);

        Ok(digest)
    }

    /// Public profile of a GitHub account
    pub async fn user_profile(&self, username: &str) -> Result<UserProfile> {
        let username = validate_username(username)?;
        let body = self.get_json(&format!("/users/{username}"), &[]).await?;

        let raw: RawUser =
            serde_json::from_value(body).map_err(|e| GithubError::Decode(e.to_string()))?;
        Ok(UserProfile {
            username: raw.login,
            name: raw.name,
            public_repos: raw.public_repos,
            followers: raw.followers,
        })
    }

    /// Public repositories of a GitHub account (first page)
    pub async fn user_repos(&self, username: &str) -> Result<Vec<RepoSummary>> {
        let username = validate_username(username)?;
        let body = self
            .get_json(&format!("/users/{username}/repos"), &[])
            .await?;

        let repos = decode_items::<RawRepo>(body, usize::MAX)
            .into_iter()
            .map(|r| RepoSummary {
                name: r.name,
                stars: r.stargazers_count,
                language: r.language,
            })
            .collect();

        Ok(repos)
    }
}
