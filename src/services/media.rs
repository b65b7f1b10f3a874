//! Media service. Passthrough persistence only; no file bytes move through
//! this process.

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder,
};
use serde::Deserialize;

use crate::db::entities::media;
use crate::db::now_timestamp;
use crate::error::{map_unique_violation, Result, ServiceError};

use super::load_owned_site;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMediaRequest {
    pub filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub storage_type: String,
    #[serde(default)]
    pub external_url: Option<String>,
}

pub struct MediaService {
    db: DatabaseConnection,
}

impl MediaService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_site_media(&self, user_id: i32, site_id: i32) -> Result<Vec<media::Model>> {
        let site_row = load_owned_site(&self.db, site_id, user_id).await?;
        Ok(media::Entity::find()
            .filter(media::Column::SiteId.eq(site_row.id))
            .order_by_desc(media::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn create_media(
        &self,
        user_id: i32,
        site_id: i32,
        req: CreateMediaRequest,
    ) -> Result<media::Model> {
        let site_row = load_owned_site(&self.db, site_id, user_id).await?;

        media::ActiveModel {
            site_id: Set(site_row.id),
            filename: Set(req.filename),
            file_path: Set(req.file_path),
            file_size: Set(req.file_size),
            mime_type: Set(req.mime_type),
            storage_type: Set(req.storage_type),
            external_url: Set(req.external_url),
            created_at: Set(now_timestamp()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "media file path"))
    }

    pub async fn delete_media(&self, user_id: i32, media_id: i32) -> Result<()> {
        let row = media::Entity::find_by_id(media_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("media", media_id.to_string()))?;

        // Ownership flows through the owning site.
        load_owned_site(&self.db, row.site_id, user_id).await?;

        row.delete(&self.db).await?;
        Ok(())
    }
}
