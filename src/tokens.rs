//! Access token resolution.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

use crate::db::entities::git_integration;
use crate::db::now_timestamp;
use crate::error::{Result, ServiceError, TokenFailure};
use crate::hosting::GitHostingProvider;

/// Resolves a user id to a validated hosting access token.
///
/// A token that fails the validation probe is cleared in storage before the
/// failure is reported, so the user must reconnect; there is no soft retry.
pub struct AccessTokenResolver {
    db: DatabaseConnection,
    provider: Arc<dyn GitHostingProvider>,
    platform: String,
}

impl AccessTokenResolver {
    pub fn new(db: DatabaseConnection, provider: Arc<dyn GitHostingProvider>) -> Self {
        Self {
            db,
            provider,
            platform: "github".to_string(),
        }
    }

    pub async fn resolve(&self, user_id: i32) -> Result<String> {
        let integration = git_integration::Entity::find()
            .filter(git_integration::Column::UserId.eq(user_id))
            .filter(git_integration::Column::Platform.eq(self.platform.clone()))
            .one(&self.db)
            .await?;

        let Some(integration) = integration else {
            return Err(ServiceError::Token(TokenFailure::NoIntegration));
        };
        if integration.access_token.is_empty() {
            return Err(ServiceError::Token(TokenFailure::NoIntegration));
        }

        let validation = self.provider.validate_token(&integration.access_token).await;
        if validation.is_valid {
            return Ok(integration.access_token);
        }

        // Clear the stored token so subsequent calls report a missing
        // integration instead of re-probing a dead credential.
        let reason = validation
            .reason
            .unwrap_or_else(|| "access token is no longer valid".to_string());
        tracing::warn!(user_id, "clearing invalid git access token: {}", reason);

        let mut active: git_integration::ActiveModel = integration.into();
        active.access_token = Set(String::new());
        active.updated_at = Set(now_timestamp());
        active.update(&self.db).await?;

        Err(ServiceError::Token(TokenFailure::Invalid(reason)))
    }
}
