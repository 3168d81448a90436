//! GitHub REST API client.
//!
//! Only the small subset of the API that is needed to manage assignment
//! repositories is covered: repository deletion, repository metadata,
//! commit listing and user lookup. Repositories and users are always
//! addressed by their numeric identifiers, which, unlike names, survive
//! renames and transfers.

use async_trait::async_trait;
use derive_more::{Display, Error, From};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config;

/// Errors returned by GitHub API requests.
///
/// Every failure of a remote call is represented by this type, which lets
/// callers handle the whole error family at once.
#[derive(Debug, Display, From, Error)]
pub enum GitHubError {
    /// Transport or response decoding error.
    Http(reqwest::Error),

    /// Requested resource does not exist, or is not visible with the current credentials.
    #[display(fmt = "resource not found")]
    NotFound,

    /// Any other non-successful response.
    #[display(fmt = "unexpected response status {}", _0)]
    #[from(ignore)]
    UnexpectedStatus(#[error(not(source))] u16),
}

/// Repository metadata.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub full_name: String,
    pub default_branch: String,
}

/// Commit author or committer signature.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub date: String,
}

/// Git-level commit details.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CommitDetails {
    pub message: String,
    pub author: Option<Signature>,
}

/// Single repository commit.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub commit: CommitDetails,
}

/// GitHub account information.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: i64,
    pub login: String,
}

/// GitHub API operations.
#[async_trait]
pub trait GitHubClient: Send + Sync {
    /// Delete a repository with the provided identifier.
    async fn delete_repository(&self, repo_id: i64) -> Result<(), GitHubError>;

    /// Fetch repository metadata.
    async fn repository(&self, repo_id: i64) -> Result<Repository, GitHubError>;

    /// List commits reachable from the provided branch.
    async fn commits(&self, repo_id: i64, branch: &str) -> Result<Vec<Commit>, GitHubError>;

    /// Fetch account information by the user identifier.
    async fn user(&self, uid: i64) -> Result<User, GitHubError>;
}

/// [`GitHubClient`] implementation which talks to the REST API over HTTP.
pub struct HttpClient {
    client: Client,
    api_url: String,
    token: String,
}

impl HttpClient {
    /// Create new [`HttpClient`] from the provided [`GitHub`] configuration.
    ///
    /// [`GitHub`]: config::GitHub
    pub fn new(config: &config::GitHub) -> Result<Self, GitHubError> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            token: config.token.clone(),
        })
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header(header::ACCEPT, "application/vnd.github+json")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

/// Map non-successful responses into [`GitHubError`] values.
fn check_status(response: Response) -> Result<Response, GitHubError> {
    match status_error(response.status()) {
        Some(err) => Err(err),
        None => Ok(response),
    }
}

fn status_error(status: StatusCode) -> Option<GitHubError> {
    if status.is_success() {
        None
    } else if status == StatusCode::NOT_FOUND {
        Some(GitHubError::NotFound)
    } else {
        Some(GitHubError::UnexpectedStatus(status.as_u16()))
    }
}

#[async_trait]
impl GitHubClient for HttpClient {
    async fn delete_repository(&self, repo_id: i64) -> Result<(), GitHubError> {
        debug!(repo_id, "deleting repository");

        let response = self
            .request(self.client.delete(self.url(&format!("/repositories/{repo_id}"))))
            .send()
            .await?;

        check_status(response)?;

        Ok(())
    }

    async fn repository(&self, repo_id: i64) -> Result<Repository, GitHubError> {
        let response = self
            .request(self.client.get(self.url(&format!("/repositories/{repo_id}"))))
            .send()
            .await?;

        Ok(check_status(response)?.json().await?)
    }

    async fn commits(&self, repo_id: i64, branch: &str) -> Result<Vec<Commit>, GitHubError> {
        let response = self
            .request(
                self.client
                    .get(self.url(&format!("/repositories/{repo_id}/commits")))
                    .query(&[("sha", branch)]),
            )
            .send()
            .await?;

        Ok(check_status(response)?.json().await?)
    }

    async fn user(&self, uid: i64) -> Result<User, GitHubError> {
        let response = self
            .request(self.client.get(self.url(&format!("/user/{uid}"))))
            .send()
            .await?;

        Ok(check_status(response)?.json().await?)
    }
}
