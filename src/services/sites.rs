//! Site service: creation (with repository provisioning), lookup, update and
//! deletion.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder,
};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::db::entities::site;
use crate::db::now_timestamp;
use crate::error::{map_unique_violation, Result};
use crate::hosting::GitHostingProvider;
use crate::provision::{ProvisionRequest, RepositoryProvisioner, TemplateData};
use crate::sync::ArticleSyncEngine;
use crate::tokens::AccessTokenResolver;
use crate::validate;

use super::load_owned_site;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSiteRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub template_owner: Option<String>,
    #[serde(default)]
    pub template_repo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSiteRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub git_repo: Option<String>,
    pub deploy_status: Option<String>,
    pub deploy_url: Option<String>,
}

pub struct SiteService {
    db: DatabaseConnection,
    tokens: AccessTokenResolver,
    provisioner: RepositoryProvisioner,
    sync: ArticleSyncEngine,
    provider: Arc<dyn GitHostingProvider>,
    config: AppConfig,
}

impl SiteService {
    pub fn new(
        db: DatabaseConnection,
        provider: Arc<dyn GitHostingProvider>,
        config: AppConfig,
    ) -> Self {
        Self {
            tokens: AccessTokenResolver::new(db.clone(), provider.clone()),
            provisioner: RepositoryProvisioner::new(provider.clone()),
            sync: ArticleSyncEngine::new(db.clone(), provider.clone()),
            db,
            provider,
            config,
        }
    }

    /// Create a site: provision its repository from a template, persist the
    /// row, then import any pre-existing markdown as articles.
    pub async fn create_site(&self, user_id: i32, req: CreateSiteRequest) -> Result<site::Model> {
        validate::site_name(&req.name)?;

        let token = self.tokens.resolve(user_id).await?;

        let hosting_user = self.provider.fetch_authenticated_user(&token).await?;
        let author = req.author.unwrap_or_else(|| hosting_user.login.clone());
        let description = req.description.clone().unwrap_or_default();

        let request = ProvisionRequest {
            name: req.name.clone(),
            description: description.clone(),
            template_owner: req
                .template_owner
                .unwrap_or_else(|| self.config.default_template.owner.clone()),
            template_repo: req
                .template_repo
                .unwrap_or_else(|| self.config.default_template.repo.clone()),
        };
        let template_data = TemplateData {
            site_name: req.name.clone(),
            description,
            author,
            github_username: hosting_user.login,
        };

        let outcome = self
            .provisioner
            .provision(&token, &request, Some(&template_data))
            .await?;

        let now = now_timestamp();
        let row = site::ActiveModel {
            user_id: Set(user_id),
            name: Set(req.name),
            description: Set(req.description),
            git_repo: Set(Some(outcome.repo.full_name.clone())),
            platform: Set("github".to_string()),
            deploy_status: Set("deployed".to_string()),
            deploy_url: Set(Some(outcome.pages_url)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "site name"))?;

        // Template repos may ship sample articles; pull them in. A failed
        // import never fails site creation.
        match self
            .sync
            .import_from_repo(&row, &outcome.repo.full_name, &token)
            .await
        {
            Ok(report) => {
                tracing::info!(
                    site = row.id,
                    imported = report.imported,
                    total = report.total,
                    "imported articles from new repository"
                );
            }
            Err(e) => {
                tracing::warn!(site = row.id, "article import after creation failed: {}", e);
            }
        }

        Ok(row)
    }

    pub async fn find_site(&self, user_id: i32, site_id: i32) -> Result<site::Model> {
        load_owned_site(&self.db, site_id, user_id).await
    }

    pub async fn list_user_sites(&self, user_id: i32) -> Result<Vec<site::Model>> {
        Ok(site::Entity::find()
            .filter(site::Column::UserId.eq(user_id))
            .order_by_desc(site::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Administrative update. Changing `git_repo` here does not re-point the
    /// sync engine retroactively; previously published files stay where they
    /// are.
    pub async fn update_site(
        &self,
        user_id: i32,
        site_id: i32,
        req: UpdateSiteRequest,
    ) -> Result<site::Model> {
        let row = load_owned_site(&self.db, site_id, user_id).await?;

        if let Some(name) = &req.name {
            validate::site_name(name)?;
        }

        let mut active: site::ActiveModel = row.into();
        if let Some(name) = req.name {
            active.name = Set(name);
        }
        if let Some(description) = req.description {
            active.description = Set(Some(description));
        }
        if let Some(git_repo) = req.git_repo {
            active.git_repo = Set(Some(git_repo));
        }
        if let Some(deploy_status) = req.deploy_status {
            active.deploy_status = Set(deploy_status);
        }
        if let Some(deploy_url) = req.deploy_url {
            active.deploy_url = Set(Some(deploy_url));
        }
        active.updated_at = Set(now_timestamp());

        active
            .update(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, "site name"))
    }

    /// Delete the database row. The hosted repository is deliberately left in
    /// place.
    pub async fn delete_site(&self, user_id: i32, site_id: i32) -> Result<()> {
        let row = load_owned_site(&self.db, site_id, user_id).await?;
        row.delete(&self.db).await?;
        Ok(())
    }
}
