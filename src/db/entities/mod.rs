//! SeaORM entity definitions.

pub mod article;
pub mod git_integration;
pub mod media;
pub mod site;
pub mod user;
