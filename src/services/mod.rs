//! Domain orchestration services.
//!
//! Combine the hosting provider, provisioner, sync engine and token resolver
//! with the database under uniform access-control checks. Convention for
//! ownership failures: NotFound when the row is truly absent, AccessDenied
//! when it exists but belongs to someone else.

pub mod articles;
pub mod media;
pub mod sites;
pub mod users;

use std::sync::Arc;

use sea_orm::{DatabaseConnection, EntityTrait};

use crate::config::AppConfig;
use crate::db::entities::site;
use crate::error::{Result, ServiceError};
use crate::hosting::GitHostingProvider;

pub use articles::ArticleService;
pub use media::MediaService;
pub use sites::SiteService;
pub use users::UserService;

/// All services, built over one database handle and one hosting provider.
pub struct Services {
    pub sites: SiteService,
    pub articles: ArticleService,
    pub media: MediaService,
    pub users: UserService,
}

impl Services {
    pub fn new(
        db: DatabaseConnection,
        provider: Arc<dyn GitHostingProvider>,
        config: AppConfig,
    ) -> Self {
        Self {
            sites: SiteService::new(db.clone(), provider.clone(), config),
            articles: ArticleService::new(db.clone(), provider.clone()),
            media: MediaService::new(db.clone()),
            users: UserService::new(db, provider),
        }
    }
}

/// Load a site and enforce ownership.
pub(crate) async fn load_owned_site(
    db: &DatabaseConnection,
    site_id: i32,
    user_id: i32,
) -> Result<site::Model> {
    let row = site::Entity::find_by_id(site_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("site", site_id.to_string()))?;
    if row.user_id != user_id {
        return Err(ServiceError::AccessDenied);
    }
    Ok(row)
}

/// A site's linked repository, or a fail-fast validation error when none is
/// linked.
pub(crate) fn require_repo(site_row: &site::Model) -> Result<&str> {
    site_row
        .git_repo
        .as_deref()
        .ok_or_else(|| ServiceError::Validation {
            field: "site",
            message: "site has no linked repository".to_string(),
        })
}
