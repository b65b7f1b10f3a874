//! User service: upserts the local account and git integration after an
//! OAuth login against the hosting provider.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

use crate::db::entities::{git_integration, user};
use crate::db::now_timestamp;
use crate::error::Result;
use crate::hosting::GitHostingProvider;

pub struct UserService {
    db: DatabaseConnection,
    provider: Arc<dyn GitHostingProvider>,
}

impl UserService {
    pub fn new(db: DatabaseConnection, provider: Arc<dyn GitHostingProvider>) -> Self {
        Self { db, provider }
    }

    /// Complete an OAuth login: fetch the hosting account behind the access
    /// token, upsert the local user by username and store the token in the
    /// user's github integration.
    pub async fn login_with_token(&self, access_token: &str) -> Result<user::Model> {
        let hosting_user = self.provider.fetch_authenticated_user(access_token).await?;

        // The /user response often omits the email; the emails endpoint is
        // optional data and its failure is swallowed.
        let email = match hosting_user.email.clone() {
            Some(email) => Some(email),
            None => self
                .provider
                .fetch_user_emails(access_token)
                .await
                .and_then(|emails| {
                    emails
                        .iter()
                        .find(|e| e.primary)
                        .or_else(|| emails.first())
                        .map(|e| e.email.clone())
                }),
        };

        let now = now_timestamp();

        let row = match user::Entity::find()
            .filter(user::Column::Username.eq(hosting_user.login.clone()))
            .one(&self.db)
            .await?
        {
            Some(existing) => {
                let mut active: user::ActiveModel = existing.into();
                if email.is_some() {
                    active.email = Set(email.clone());
                }
                active.avatar_url = Set(hosting_user.avatar_url.clone());
                active.update(&self.db).await?
            }
            None => {
                user::ActiveModel {
                    username: Set(hosting_user.login.clone()),
                    email: Set(email.clone()),
                    avatar_url: Set(hosting_user.avatar_url.clone()),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.db)
                .await?
            }
        };

        self.upsert_integration(row.id, &hosting_user.login, access_token)
            .await?;

        tracing::info!(user = row.id, username = %row.username, "user logged in");
        Ok(row)
    }

    async fn upsert_integration(
        &self,
        user_id: i32,
        platform_username: &str,
        access_token: &str,
    ) -> Result<()> {
        let now = now_timestamp();
        let existing = git_integration::Entity::find()
            .filter(git_integration::Column::UserId.eq(user_id))
            .filter(git_integration::Column::Platform.eq("github"))
            .one(&self.db)
            .await?;

        match existing {
            Some(row) => {
                let mut active: git_integration::ActiveModel = row.into();
                active.platform_username = Set(platform_username.to_string());
                active.access_token = Set(access_token.to_string());
                active.updated_at = Set(now);
                active.update(&self.db).await?;
            }
            None => {
                git_integration::ActiveModel {
                    user_id: Set(user_id),
                    platform: Set("github".to_string()),
                    platform_username: Set(platform_username.to_string()),
                    access_token: Set(access_token.to_string()),
                    installation_id: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.db)
                .await?;
            }
        }
        Ok(())
    }

    pub async fn find_user(&self, user_id: i32) -> Result<Option<user::Model>> {
        Ok(user::Entity::find_by_id(user_id).one(&self.db).await?)
    }
}
