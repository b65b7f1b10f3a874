//! Repository provisioning.
//!
//! Takes a site-creation request through template instantiation, placeholder
//! substitution and pages enablement against an eventually-consistent hosting
//! API. Earlier side effects are not rolled back when a later step fails; the
//! created repository stays and the error tells the caller which step broke.

pub mod template;

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, ServiceError};
use crate::hosting::{GitHostingProvider, HostingError, ProvisionedRepo};

pub use template::TemplateData;

/// Delay before the first tree listing attempt; a freshly generated
/// repository is usually not queryable immediately.
const INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Maximum tree listing attempts while the repository initializes.
const MAX_TREE_ATTEMPTS: u32 = 10;

/// First backoff step; doubles on every retry.
const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Error message fragment GitHub returns while the generated repository has
/// no commits yet.
const EMPTY_REPO_SIGNATURE: &str = "Git Repository is empty";

#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub name: String,
    pub description: String,
    pub template_owner: String,
    pub template_repo: String,
}

#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    pub repo: ProvisionedRepo,
    pub pages_url: String,
}

pub struct RepositoryProvisioner {
    provider: Arc<dyn GitHostingProvider>,
}

impl RepositoryProvisioner {
    pub fn new(provider: Arc<dyn GitHostingProvider>) -> Self {
        Self { provider }
    }

    /// Run the full provisioning chain: create from template, substitute
    /// placeholders, enable pages. Steps are strictly ordered and failures
    /// short-circuit; a repository created by step 1 is never deleted here.
    pub async fn provision(
        &self,
        token: &str,
        request: &ProvisionRequest,
        template_data: Option<&TemplateData>,
    ) -> Result<ProvisionOutcome> {
        let repo = self
            .provider
            .create_from_template(
                token,
                &request.template_owner,
                &request.template_repo,
                &request.name,
                &request.description,
            )
            .await
            .map_err(|e| ServiceError::RepositoryCreation {
                repo_name: request.name.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(repo = %repo.full_name, "repository created from template");

        if let Some(data) = template_data {
            // The repo already exists at this point, so a substitution
            // failure still reports as a creation failure with the repo left
            // in place for manual cleanup.
            self.substitute_placeholders(token, &repo, data)
                .await
                .map_err(|e| ServiceError::RepositoryCreation {
                    repo_name: repo.full_name.clone(),
                    reason: format!("placeholder substitution failed: {}", e),
                })?;
        }

        let pages_url = self
            .provider
            .enable_pages_workflow(token, &repo.full_name)
            .await
            .map_err(|e| ServiceError::PagesDeployment {
                repo_name: repo.full_name.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(repo = %repo.full_name, url = %pages_url, "pages deployment enabled");

        Ok(ProvisionOutcome { repo, pages_url })
    }

    /// Replace `{{TOKEN}}` markers across the repository's text files.
    ///
    /// Files are processed sequentially to stay under the provider's rate
    /// limit; do not parallelize these writes.
    async fn substitute_placeholders(
        &self,
        token: &str,
        repo: &ProvisionedRepo,
        data: &TemplateData,
    ) -> std::result::Result<(), HostingError> {
        tokio::time::sleep(INITIAL_DELAY).await;

        let tree = self.list_tree_with_retry(token, repo).await?;

        for entry in tree.iter().filter(|e| e.kind == "blob") {
            if !template::is_text_path(&entry.path) {
                continue;
            }

            let file = self
                .provider
                .get_file(token, &repo.full_name, &entry.path)
                .await?;

            if let Some(updated) = data.apply(&file.content) {
                self.provider
                    .put_file(
                        token,
                        &repo.full_name,
                        &entry.path,
                        &updated,
                        "Configure site from template",
                        Some(&file.sha),
                    )
                    .await?;
                tracing::debug!(path = %entry.path, "substituted template placeholders");
            }
        }

        Ok(())
    }

    /// List the tree at the default branch, retrying with exponential backoff
    /// while the repository is still initializing. Only the documented
    /// "not ready" signatures are retried; anything else fails immediately.
    async fn list_tree_with_retry(
        &self,
        token: &str,
        repo: &ProvisionedRepo,
    ) -> std::result::Result<Vec<crate::hosting::TreeEntry>, HostingError> {
        let mut backoff = BACKOFF_BASE;

        for attempt in 1..=MAX_TREE_ATTEMPTS {
            match self
                .provider
                .list_tree(token, &repo.full_name, &repo.default_branch)
                .await
            {
                Ok(tree) => return Ok(tree),
                Err(e) if is_repo_not_ready(&e) && attempt < MAX_TREE_ATTEMPTS => {
                    tracing::debug!(
                        repo = %repo.full_name,
                        attempt,
                        "repository not ready yet, backing off {:?}",
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(e),
            }
        }

        unreachable!("retry loop always returns within MAX_TREE_ATTEMPTS")
    }
}

/// Whether a tree listing failure means the generated repository is still
/// initializing. 409 and 422 are the transient statuses GitHub returns; the
/// empty-repository message covers the window before the first commit lands.
fn is_repo_not_ready(err: &HostingError) -> bool {
    err.status == 409 || err.status == 422 || err.message.contains(EMPTY_REPO_SIGNATURE)
}
