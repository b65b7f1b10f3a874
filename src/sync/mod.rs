//! Article synchronization engine.
//!
//! Bidirectional translation between database article rows and markdown
//! files with front matter in the hosted repository. The database row is
//! authoritative; hosted files are reconciled only on explicit import,
//! publish and delete actions.

pub mod front_matter;

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use serde::Serialize;

use crate::db::entities::article::{self, STATUS_DRAFT, STATUS_PUBLISHED};
use crate::db::entities::site;
use crate::db::now_timestamp;
use crate::error::Result;
use crate::hosting::GitHostingProvider;

/// Directory in the hosted repository holding article markdown.
const CONTENT_DIR: &str = "content/";

/// Hosted file path for an article slug. A pure function of the slug; slug
/// renames do not move previously published files (unsupported, the old file
/// is left behind).
pub fn article_file_path(slug: &str) -> String {
    format!("content/{}.md", slug)
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub total: usize,
    pub articles: Vec<article::Model>,
}

#[derive(Debug, Serialize)]
pub struct PublishReport {
    pub published: bool,
    pub file_path: String,
    pub commit_sha: String,
    pub was_update: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteReport {
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

pub struct ArticleSyncEngine {
    db: DatabaseConnection,
    provider: Arc<dyn GitHostingProvider>,
}

impl ArticleSyncEngine {
    pub fn new(db: DatabaseConnection, provider: Arc<dyn GitHostingProvider>) -> Self {
        Self { db, provider }
    }

    /// Import markdown files under `content/` as articles. Existing slugs are
    /// skipped, never overwritten; per-file failures are logged and skipped.
    /// Returns counts rather than failing the batch.
    pub async fn import_from_repo(
        &self,
        site_row: &site::Model,
        repo_full_name: &str,
        token: &str,
    ) -> Result<ImportReport> {
        let tree = self.provider.list_tree(token, repo_full_name, "HEAD").await?;

        let markdown_paths: Vec<&str> = tree
            .iter()
            .filter(|e| {
                e.kind == "blob" && e.path.starts_with(CONTENT_DIR) && e.path.ends_with(".md")
            })
            .map(|e| e.path.as_str())
            .collect();

        let total = markdown_paths.len();
        let mut articles = Vec::new();

        for path in markdown_paths {
            match self.import_one(site_row, repo_full_name, token, path).await {
                Ok(Some(model)) => articles.push(model),
                Ok(None) => {} // existing slug, skipped
                Err(e) => {
                    tracing::warn!(path, "failed to import article, skipping: {}", e);
                }
            }
        }

        Ok(ImportReport {
            imported: articles.len(),
            total,
            articles,
        })
    }

    /// Import one file. `Ok(None)` means an article with this slug already
    /// exists and was left untouched.
    async fn import_one(
        &self,
        site_row: &site::Model,
        repo_full_name: &str,
        token: &str,
        path: &str,
    ) -> Result<Option<article::Model>> {
        let file = self.provider.get_file(token, repo_full_name, path).await?;

        let file_slug = path
            .trim_start_matches(CONTENT_DIR)
            .trim_end_matches(".md")
            .to_string();

        let parsed = front_matter::parse(&file.content);
        let slug = parsed.slug.unwrap_or(file_slug);
        let title = parsed
            .title
            .unwrap_or_else(|| front_matter::title_from_slug(&slug));
        let status = if parsed.draft { STATUS_DRAFT } else { STATUS_PUBLISHED };

        let existing = article::Entity::find()
            .filter(article::Column::SiteId.eq(site_row.id))
            .filter(article::Column::Slug.eq(slug.clone()))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            tracing::debug!(slug, "article already exists, skipping import");
            return Ok(None);
        }

        let now = now_timestamp();
        let model = article::ActiveModel {
            site_id: Set(site_row.id),
            title: Set(title),
            slug: Set(slug),
            content: Set(parsed.content),
            status: Set(status.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(Some(model))
    }

    /// Publish an article to the hosted repository and mark it published.
    ///
    /// The remote write happens first; only on success is the database row
    /// updated. Publishing never reads the hosted file back for external
    /// edits and there is no unpublish path.
    pub async fn publish(
        &self,
        article_row: &article::Model,
        repo_full_name: &str,
        token: &str,
    ) -> Result<PublishReport> {
        let file_path = article_file_path(&article_row.slug);
        let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let body = front_matter::render(&article_row.title, &date, &article_row.content);

        // Probe for an existing file to get its sha. 404 means create; any
        // other failure propagates.
        let existing_sha = match self
            .provider
            .get_file(token, repo_full_name, &file_path)
            .await
        {
            Ok(file) => Some(file.sha),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };

        let was_update = existing_sha.is_some();
        let message = if was_update {
            format!("Update article: {}", article_row.slug)
        } else {
            format!("Add article: {}", article_row.slug)
        };

        let commit_sha = self
            .provider
            .put_file(
                token,
                repo_full_name,
                &file_path,
                &body,
                &message,
                existing_sha.as_deref(),
            )
            .await?;

        // Unconditional one-way transition, even if already published.
        let mut active: article::ActiveModel = article_row.clone().into();
        active.status = Set(STATUS_PUBLISHED.to_string());
        active.updated_at = Set(now_timestamp());
        active.update(&self.db).await?;

        tracing::info!(slug = %article_row.slug, %file_path, was_update, "article published");

        Ok(PublishReport {
            published: true,
            file_path,
            commit_sha,
            was_update,
        })
    }

    /// Remove an article's hosted file, best effort. A missing repository or
    /// missing file is a success-shaped no-op, not an error; database
    /// deletion is handled by the caller independently of this outcome.
    pub async fn delete_from_repo(
        &self,
        article_row: &article::Model,
        repo_full_name: Option<&str>,
        token: &str,
    ) -> Result<DeleteReport> {
        let Some(repo_full_name) = repo_full_name else {
            return Ok(DeleteReport {
                deleted: false,
                reason: Some("no linked repository".to_string()),
                file_path: None,
            });
        };

        let file_path = article_file_path(&article_row.slug);

        let file = match self
            .provider
            .get_file(token, repo_full_name, &file_path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.is_not_found() => {
                return Ok(DeleteReport {
                    deleted: false,
                    reason: Some("File not found".to_string()),
                    file_path: Some(file_path),
                });
            }
            Err(e) => return Err(e.into()),
        };

        self.provider
            .delete_file(
                token,
                repo_full_name,
                &file_path,
                &file.sha,
                &format!("Delete article: {}", article_row.slug),
            )
            .await?;

        tracing::info!(slug = %article_row.slug, %file_path, "article removed from repository");

        Ok(DeleteReport {
            deleted: true,
            reason: None,
            file_path: Some(file_path),
        })
    }
}
