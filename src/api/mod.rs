pub mod handlers;
pub mod session;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

pub use handlers::AppState;
pub use session::SessionManager;

/// Build the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        // Auth
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/me", get(handlers::me))
        // Sites
        .route("/api/sites", get(handlers::list_sites).post(handlers::create_site))
        .route(
            "/api/sites/:id",
            get(handlers::get_site)
                .patch(handlers::update_site)
                .delete(handlers::delete_site),
        )
        // Articles
        .route(
            "/api/sites/:id/articles",
            get(handlers::list_site_articles).post(handlers::create_article),
        )
        .route("/api/sites/:id/articles/import", post(handlers::import_articles))
        .route("/api/articles", get(handlers::list_user_articles))
        .route(
            "/api/articles/:id",
            get(handlers::get_article)
                .patch(handlers::update_article)
                .delete(handlers::delete_article),
        )
        .route("/api/articles/:id/publish", post(handlers::publish_article))
        .route(
            "/api/articles/:id/repo-file",
            delete(handlers::delete_article_repo_file),
        )
        // Media
        .route(
            "/api/sites/:id/media",
            get(handlers::list_media).post(handlers::create_media),
        )
        .route("/api/media/:id", delete(handlers::delete_media))
        // Health check
        .route("/health", get(handlers::health))
}
