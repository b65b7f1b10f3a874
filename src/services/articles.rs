//! Article service: CRUD plus the repository-facing publish, import and
//! delete workflows.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};

use crate::db::entities::article::{self, STATUS_DRAFT, STATUS_PUBLISHED};
use crate::db::entities::site;
use crate::db::now_timestamp;
use crate::error::{map_unique_violation, Result, ServiceError};
use crate::hosting::GitHostingProvider;
use crate::sync::{ArticleSyncEngine, DeleteReport, ImportReport, PublishReport};
use crate::tokens::AccessTokenResolver;
use crate::validate;

use super::{load_owned_site, require_repo};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
}

/// Response for the combined article delete: the row is gone; the hosted
/// file removal is best effort and reported, never fatal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteArticleReport {
    pub deleted: bool,
    pub repo: Option<DeleteReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_error: Option<String>,
}

pub struct ArticleService {
    db: DatabaseConnection,
    tokens: AccessTokenResolver,
    sync: ArticleSyncEngine,
}

impl ArticleService {
    pub fn new(db: DatabaseConnection, provider: Arc<dyn GitHostingProvider>) -> Self {
        Self {
            tokens: AccessTokenResolver::new(db.clone(), provider.clone()),
            sync: ArticleSyncEngine::new(db.clone(), provider),
            db,
        }
    }

    /// Load an article together with its owning site, enforcing ownership
    /// through the site row.
    async fn load_owned(
        &self,
        user_id: i32,
        article_id: i32,
    ) -> Result<(article::Model, site::Model)> {
        let row = article::Entity::find_by_id(article_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("article", article_id.to_string()))?;

        let site_row = site::Entity::find_by_id(row.site_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("site", row.site_id.to_string()))?;
        if site_row.user_id != user_id {
            return Err(ServiceError::AccessDenied);
        }

        Ok((row, site_row))
    }

    pub async fn create_article(
        &self,
        user_id: i32,
        site_id: i32,
        req: CreateArticleRequest,
    ) -> Result<article::Model> {
        validate::title(&req.title)?;
        validate::slug(&req.slug)?;
        let status = match req.status.as_deref() {
            None | Some(STATUS_DRAFT) => STATUS_DRAFT,
            Some(STATUS_PUBLISHED) => STATUS_PUBLISHED,
            Some(other) => {
                return Err(ServiceError::Validation {
                    field: "status",
                    message: format!("unknown status '{}'", other),
                })
            }
        };

        let site_row = load_owned_site(&self.db, site_id, user_id).await?;

        let now = now_timestamp();
        article::ActiveModel {
            site_id: Set(site_row.id),
            title: Set(req.title),
            slug: Set(req.slug),
            content: Set(req.content),
            status: Set(status.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "article slug"))
    }

    pub async fn find_article(&self, user_id: i32, article_id: i32) -> Result<article::Model> {
        let (row, _) = self.load_owned(user_id, article_id).await?;
        Ok(row)
    }

    pub async fn list_site_articles(
        &self,
        user_id: i32,
        site_id: i32,
    ) -> Result<Vec<article::Model>> {
        let site_row = load_owned_site(&self.db, site_id, user_id).await?;
        Ok(article::Entity::find()
            .filter(article::Column::SiteId.eq(site_row.id))
            .order_by_desc(article::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn list_user_articles(&self, user_id: i32) -> Result<Vec<article::Model>> {
        let site_ids: Vec<i32> = site::Entity::find()
            .filter(site::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();

        if site_ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(article::Entity::find()
            .filter(article::Column::SiteId.is_in(site_ids))
            .order_by_desc(article::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Update an article row. Renaming the slug does not move a previously
    /// published hosted file; the next publish writes under the new slug and
    /// the old file stays until deleted by hand.
    pub async fn update_article(
        &self,
        user_id: i32,
        article_id: i32,
        req: UpdateArticleRequest,
    ) -> Result<article::Model> {
        let (row, _) = self.load_owned(user_id, article_id).await?;

        if let Some(title) = &req.title {
            validate::title(title)?;
        }
        if let Some(slug) = &req.slug {
            validate::slug(slug)?;
        }
        if let Some(status) = &req.status {
            if status != STATUS_DRAFT && status != STATUS_PUBLISHED {
                return Err(ServiceError::Validation {
                    field: "status",
                    message: format!("unknown status '{}'", status),
                });
            }
        }

        let mut active: article::ActiveModel = row.into();
        if let Some(title) = req.title {
            active.title = Set(title);
        }
        if let Some(slug) = req.slug {
            active.slug = Set(slug);
        }
        if let Some(content) = req.content {
            active.content = Set(content);
        }
        if let Some(status) = req.status {
            active.status = Set(status);
        }
        active.updated_at = Set(now_timestamp());

        active
            .update(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, "article slug"))
    }

    /// Delete an article. The hosted file removal is attempted first but the
    /// database deletion proceeds regardless of its outcome; the two are not
    /// transactional.
    pub async fn delete_article(&self, user_id: i32, article_id: i32) -> Result<DeleteArticleReport> {
        let (row, site_row) = self.load_owned(user_id, article_id).await?;

        let (repo, repo_error) = match self.try_delete_from_repo(user_id, &row, &site_row).await {
            Ok(report) => (Some(report), None),
            Err(e) => {
                tracing::warn!(
                    article = row.id,
                    "hosted file delete failed, removing row anyway: {}",
                    e
                );
                (None, Some(e.to_string()))
            }
        };

        row.delete(&self.db).await?;

        Ok(DeleteArticleReport {
            deleted: true,
            repo,
            repo_error,
        })
    }

    async fn try_delete_from_repo(
        &self,
        user_id: i32,
        row: &article::Model,
        site_row: &site::Model,
    ) -> Result<DeleteReport> {
        // No linked repository is a success-shaped no-op; don't resolve a
        // token for it.
        if site_row.git_repo.is_none() {
            return self.sync.delete_from_repo(row, None, "").await;
        }
        let token = self.tokens.resolve(user_id).await?;
        self.sync
            .delete_from_repo(row, site_row.git_repo.as_deref(), &token)
            .await
    }

    /// Publish an article's markdown to the linked repository and mark the
    /// row published.
    pub async fn publish_article(&self, user_id: i32, article_id: i32) -> Result<PublishReport> {
        let (row, site_row) = self.load_owned(user_id, article_id).await?;
        let repo = require_repo(&site_row)?.to_string();
        let token = self.tokens.resolve(user_id).await?;
        self.sync.publish(&row, &repo, &token).await
    }

    /// Import markdown files from the linked repository as articles.
    pub async fn import_articles_from_repo(
        &self,
        user_id: i32,
        site_id: i32,
    ) -> Result<ImportReport> {
        let site_row = load_owned_site(&self.db, site_id, user_id).await?;
        let repo = require_repo(&site_row)?.to_string();
        let token = self.tokens.resolve(user_id).await?;
        self.sync.import_from_repo(&site_row, &repo, &token).await
    }

    /// Remove an article's hosted file without touching the database row.
    pub async fn delete_article_from_repo(
        &self,
        user_id: i32,
        article_id: i32,
    ) -> Result<DeleteReport> {
        let (row, site_row) = self.load_owned(user_id, article_id).await?;
        self.try_delete_from_repo(user_id, &row, &site_row).await
    }
}
