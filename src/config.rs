//! Application configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration for the GitHub-shaped hosting API.
#[derive(Debug, Clone)]
pub struct HostingConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_base: String,
    /// Pinned API version sent on every request.
    pub api_version: String,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            api_version: "2022-11-28".to_string(),
            user_agent: "pagesmith".to_string(),
        }
    }
}

/// Template repository to instantiate when a site request does not name one.
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    pub owner: String,
    pub repo: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            owner: "pagesmith-templates".to_string(),
            repo: "starter-site".to_string(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub hosting: HostingConfig,
    pub default_template: TemplateConfig,
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hosting: HostingConfig::default(),
            default_template: TemplateConfig::default(),
            db_path: std::env::temp_dir().join("pagesmith").join("pagesmith.db"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base) = std::env::var("PAGESMITH_GITHUB_API_BASE") {
            config.hosting.api_base = base.trim_end_matches('/').to_string();
        }
        if let Ok(path) = std::env::var("PAGESMITH_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Ok(addr) = std::env::var("PAGESMITH_BIND_ADDR") {
            if let Ok(parsed) = addr.parse() {
                config.bind_addr = parsed;
            }
        }
        if let Ok(template) = std::env::var("PAGESMITH_DEFAULT_TEMPLATE") {
            if let Some((owner, repo)) = template.split_once('/') {
                config.default_template = TemplateConfig {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                };
            }
        }

        config
    }
}
