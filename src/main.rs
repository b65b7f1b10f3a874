use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pagesmith::api::{self, AppState, SessionManager};
use pagesmith::config::AppConfig;
use pagesmith::hosting::GitHubClient;
use pagesmith::services::Services;
use pagesmith::{db, hosting::GitHostingProvider};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagesmith=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    let db = db::init_database(&config.db_path)
        .await
        .expect("Failed to initialize database");
    tracing::info!("Database initialized at {:?}", config.db_path);

    let provider: Arc<dyn GitHostingProvider> =
        Arc::new(GitHubClient::new(config.hosting.clone()));

    let state = Arc::new(AppState {
        services: Services::new(db, provider, config.clone()),
        sessions: SessionManager::new(),
    });

    let app = api::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");
    axum::serve(listener, app)
        .await
        .expect("Server error");
}
