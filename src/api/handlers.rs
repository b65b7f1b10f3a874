//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::error::{Result, ServiceError, TokenFailure};
use crate::services::articles::{CreateArticleRequest, UpdateArticleRequest};
use crate::services::media::CreateMediaRequest;
use crate::services::sites::{CreateSiteRequest, UpdateSiteRequest};
use crate::services::Services;

use super::session::SessionManager;

/// Application state shared across handlers
pub struct AppState {
    pub services: Services,
    pub sessions: SessionManager,
}

/// Resolve the authenticated user id from the Authorization header.
fn authed_user(headers: &HeaderMap, state: &AppState) -> Result<i32> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ServiceError::Token(TokenFailure::Invalid("missing session".into())))?;
    state.sessions.validate_bearer(header)
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub access_token: String,
}

/// POST /api/auth/login - complete an OAuth login with a hosting access token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Response> {
    let user = state.services.users.login_with_token(&req.access_token).await?;
    let session = state.sessions.issue(user.id);

    let body = serde_json::json!({
        "token": session.token,
        "user": user,
        "expiresAt": session
            .expires_at
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
    });
    Ok(Json(body).into_response())
}

/// GET /api/auth/me - current user
pub async fn me(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let user = state
        .services
        .users
        .find_user(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("user", user_id.to_string()))?;
    Ok(Json(user).into_response())
}

// ============================================================================
// Sites
// ============================================================================

/// POST /api/sites - create a site and provision its repository
pub async fn create_site(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateSiteRequest>,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let site = state.services.sites.create_site(user_id, req).await?;
    Ok((StatusCode::CREATED, Json(site)).into_response())
}

/// GET /api/sites - list the caller's sites
pub async fn list_sites(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let sites = state.services.sites.list_user_sites(user_id).await?;
    Ok(Json(serde_json::json!({ "sites": sites })).into_response())
}

/// GET /api/sites/:id
pub async fn get_site(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let site = state.services.sites.find_site(user_id, site_id).await?;
    Ok(Json(site).into_response())
}

/// PATCH /api/sites/:id
pub async fn update_site(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<i32>,
    headers: HeaderMap,
    Json(req): Json<UpdateSiteRequest>,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let site = state.services.sites.update_site(user_id, site_id, req).await?;
    Ok(Json(site).into_response())
}

/// DELETE /api/sites/:id - removes the row; the hosted repository stays
pub async fn delete_site(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    state.services.sites.delete_site(user_id, site_id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })).into_response())
}

// ============================================================================
// Articles
// ============================================================================

/// POST /api/sites/:id/articles
pub async fn create_article(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<i32>,
    headers: HeaderMap,
    Json(req): Json<CreateArticleRequest>,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let article = state
        .services
        .articles
        .create_article(user_id, site_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(article)).into_response())
}

/// GET /api/sites/:id/articles
pub async fn list_site_articles(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let articles = state
        .services
        .articles
        .list_site_articles(user_id, site_id)
        .await?;
    Ok(Json(serde_json::json!({ "articles": articles })).into_response())
}

/// GET /api/articles - every article across the caller's sites
pub async fn list_user_articles(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let articles = state.services.articles.list_user_articles(user_id).await?;
    Ok(Json(serde_json::json!({ "articles": articles })).into_response())
}

/// GET /api/articles/:id
pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(article_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let article = state.services.articles.find_article(user_id, article_id).await?;
    Ok(Json(article).into_response())
}

/// PATCH /api/articles/:id
pub async fn update_article(
    State(state): State<Arc<AppState>>,
    Path(article_id): Path<i32>,
    headers: HeaderMap,
    Json(req): Json<UpdateArticleRequest>,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let article = state
        .services
        .articles
        .update_article(user_id, article_id, req)
        .await?;
    Ok(Json(article).into_response())
}

/// DELETE /api/articles/:id - deletes the row; hosted file removal is best
/// effort and reported in the body
pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    Path(article_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let report = state.services.articles.delete_article(user_id, article_id).await?;
    Ok(Json(report).into_response())
}

/// POST /api/articles/:id/publish
pub async fn publish_article(
    State(state): State<Arc<AppState>>,
    Path(article_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let report = state
        .services
        .articles
        .publish_article(user_id, article_id)
        .await?;
    Ok(Json(report).into_response())
}

/// POST /api/sites/:id/articles/import
pub async fn import_articles(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let report = state
        .services
        .articles
        .import_articles_from_repo(user_id, site_id)
        .await?;
    Ok(Json(report).into_response())
}

/// DELETE /api/articles/:id/repo-file - remove only the hosted file
pub async fn delete_article_repo_file(
    State(state): State<Arc<AppState>>,
    Path(article_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let report = state
        .services
        .articles
        .delete_article_from_repo(user_id, article_id)
        .await?;
    Ok(Json(report).into_response())
}

// ============================================================================
// Media
// ============================================================================

/// GET /api/sites/:id/media
pub async fn list_media(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let media = state.services.media.list_site_media(user_id, site_id).await?;
    Ok(Json(serde_json::json!({ "media": media })).into_response())
}

/// POST /api/sites/:id/media
pub async fn create_media(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<i32>,
    headers: HeaderMap,
    Json(req): Json<CreateMediaRequest>,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    let media = state
        .services
        .media
        .create_media(user_id, site_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(media)).into_response())
}

/// DELETE /api/media/:id
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    Path(media_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response> {
    let user_id = authed_user(&headers, &state)?;
    state.services.media.delete_media(user_id, media_id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })).into_response())
}

// ============================================================================
// Health
// ============================================================================

/// Health check endpoint
pub async fn health() -> Response {
    let body = serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    });
    Json(body).into_response()
}
