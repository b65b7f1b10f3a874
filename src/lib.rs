//! Git-backed content management core.
//!
//! Provisions static-site repositories from templates on a Git hosting
//! provider and keeps database-held articles in sync with hosted markdown
//! files. The binary in `main.rs` serves the HTTP API; the library exposes
//! the services so tests can drive them against a mock hosting provider.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod hosting;
pub mod provision;
pub mod services;
pub mod sync;
pub mod tokens;
pub mod validate;

pub use config::AppConfig;
pub use error::{Result, ServiceError};
pub use services::Services;
