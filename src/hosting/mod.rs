//! Git hosting provider abstraction.
//!
//! The rest of the system talks to the hosting service (GitHub-shaped REST
//! API) only through the [`GitHostingProvider`] trait, so the provisioner and
//! sync engine can run against a scripted mock in tests. The concrete adapter
//! lives in [`github`].

pub mod github;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use github::GitHubClient;

/// Error from the hosting collaborator. Carries the upstream HTTP status so
/// callers can pattern-match on it (404, 409, 422, 401) to decide recovery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("hosting API error ({status}): {message}")]
pub struct HostingError {
    pub status: u16,
    pub message: String,
}

impl HostingError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

pub type HostingResult<T> = std::result::Result<T, HostingError>;

/// A repository created from a template.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionedRepo {
    pub id: i64,
    /// "owner/repo"
    pub full_name: String,
    pub html_url: String,
    pub clone_url: String,
    pub default_branch: String,
}

/// One entry of a recursive tree listing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TreeEntry {
    pub path: String,
    /// "blob" or "tree"
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
}

/// A file fetched from the repository, already base64-decoded.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub content: String,
    pub sha: String,
}

/// The authenticated hosting account.
#[derive(Debug, Clone, Deserialize)]
pub struct HostingUser {
    pub id: i64,
    pub login: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// An email address attached to the hosting account.
#[derive(Debug, Clone, Deserialize)]
pub struct HostingEmail {
    pub email: String,
    pub primary: bool,
}

/// Result of a token validation probe.
#[derive(Debug, Clone)]
pub struct TokenValidation {
    pub is_valid: bool,
    pub reason: Option<String>,
}

/// Operations the higher layers need from the hosting provider.
///
/// File content crosses this boundary as plain text; adapters own the base64
/// transport encoding and never interpret content.
#[async_trait]
pub trait GitHostingProvider: Send + Sync {
    /// Create a new repository from a template repository.
    async fn create_from_template(
        &self,
        token: &str,
        template_owner: &str,
        template_repo: &str,
        new_name: &str,
        description: &str,
    ) -> HostingResult<ProvisionedRepo>;

    /// List the full tree (recursive) at the given ref.
    async fn list_tree(
        &self,
        token: &str,
        repo_full_name: &str,
        git_ref: &str,
    ) -> HostingResult<Vec<TreeEntry>>;

    /// Fetch a file's decoded content and blob sha. A missing file surfaces
    /// as a `HostingError` with status 404; probe call sites treat that as
    /// control flow, not failure.
    async fn get_file(
        &self,
        token: &str,
        repo_full_name: &str,
        path: &str,
    ) -> HostingResult<RemoteFile>;

    /// Create or update a file. `sha` present means update, absent means
    /// create. Returns the new commit sha.
    async fn put_file(
        &self,
        token: &str,
        repo_full_name: &str,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> HostingResult<String>;

    /// Delete a file at its current blob sha.
    async fn delete_file(
        &self,
        token: &str,
        repo_full_name: &str,
        path: &str,
        sha: &str,
        message: &str,
    ) -> HostingResult<()>;

    /// Enable pages deployment with the workflow build type. Returns the
    /// pages URL, derived deterministically from the repo name rather than
    /// read back from the response.
    async fn enable_pages_workflow(
        &self,
        token: &str,
        repo_full_name: &str,
    ) -> HostingResult<String>;

    /// Fetch the account the token belongs to.
    async fn fetch_authenticated_user(&self, token: &str) -> HostingResult<HostingUser>;

    /// Fetch the account's email addresses. Email is optional data, so any
    /// failure here is swallowed to `None` rather than propagated.
    async fn fetch_user_emails(&self, token: &str) -> Option<Vec<HostingEmail>>;

    /// Probe whether the token is still accepted by the provider.
    async fn validate_token(&self, token: &str) -> TokenValidation;
}

/// Pages URL for a repository, `https://{owner}.github.io/{repo}`.
pub fn pages_url(repo_full_name: &str) -> String {
    match repo_full_name.split_once('/') {
        Some((owner, repo)) => format!("https://{}.github.io/{}", owner, repo),
        None => format!("https://{}.github.io", repo_full_name),
    }
}
