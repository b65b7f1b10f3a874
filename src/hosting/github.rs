//! GitHub adapter for the hosting provider trait.
//!
//! A thin typed wrapper over the GitHub REST API. This module owns header
//! conventions, non-2xx classification and base64 content transport; it never
//! interprets file content.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{header, Method, StatusCode};
use serde_json::{json, Value};

use crate::config::HostingConfig;

use super::{
    GitHostingProvider, HostingEmail, HostingError, HostingResult, HostingUser, ProvisionedRepo,
    RemoteFile, TokenValidation, TreeEntry,
};

pub struct GitHubClient {
    http: reqwest::Client,
    config: HostingConfig,
}

impl GitHubClient {
    pub fn new(config: HostingConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Issue an authenticated request and parse the JSON response. Non-2xx
    /// responses become `HostingError` with the body text as the message.
    async fn request(
        &self,
        token: &str,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> HostingResult<Value> {
        let url = format!("{}{}", self.config.api_base, path);

        let mut req = self
            .http
            .request(method, &url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::USER_AGENT, &self.config.user_agent)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", &self.config.api_version);

        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| HostingError::new(502, format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(HostingError::new(status.as_u16(), text));
        }

        // DELETE and a few others return an empty body.
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let text = response
            .text()
            .await
            .map_err(|e| HostingError::new(502, format!("failed to read body: {}", e)))?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| HostingError::new(502, format!("invalid JSON from provider: {}", e)))
    }
}

fn parse<T: serde::de::DeserializeOwned>(value: Value, what: &str) -> HostingResult<T> {
    serde_json::from_value(value)
        .map_err(|e| HostingError::new(502, format!("unexpected {} shape: {}", what, e)))
}

/// GitHub returns base64 content with embedded newlines.
fn decode_content(encoded: &str) -> HostingResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| HostingError::new(502, format!("invalid base64 content: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| HostingError::new(502, format!("non-utf8 file content: {}", e)))
}

#[async_trait]
impl GitHostingProvider for GitHubClient {
    async fn create_from_template(
        &self,
        token: &str,
        template_owner: &str,
        template_repo: &str,
        new_name: &str,
        description: &str,
    ) -> HostingResult<ProvisionedRepo> {
        let path = format!("/repos/{}/{}/generate", template_owner, template_repo);
        let body = json!({
            "name": new_name,
            "description": description,
            "include_all_branches": false,
            "private": false,
        });
        let value = self.request(token, Method::POST, &path, Some(body)).await?;
        parse(value, "repository")
    }

    async fn list_tree(
        &self,
        token: &str,
        repo_full_name: &str,
        git_ref: &str,
    ) -> HostingResult<Vec<TreeEntry>> {
        let path = format!("/repos/{}/git/trees/{}?recursive=1", repo_full_name, git_ref);
        let value = self.request(token, Method::GET, &path, None).await?;
        let tree = value
            .get("tree")
            .cloned()
            .ok_or_else(|| HostingError::new(502, "tree listing missing 'tree' field"))?;
        parse(tree, "tree listing")
    }

    async fn get_file(
        &self,
        token: &str,
        repo_full_name: &str,
        path: &str,
    ) -> HostingResult<RemoteFile> {
        let api_path = format!("/repos/{}/contents/{}", repo_full_name, path);
        let value = self.request(token, Method::GET, &api_path, None).await?;

        let encoded = value
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| HostingError::new(502, "file response missing 'content'"))?;
        let sha = value
            .get("sha")
            .and_then(Value::as_str)
            .ok_or_else(|| HostingError::new(502, "file response missing 'sha'"))?
            .to_string();

        Ok(RemoteFile {
            content: decode_content(encoded)?,
            sha,
        })
    }

    async fn put_file(
        &self,
        token: &str,
        repo_full_name: &str,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> HostingResult<String> {
        let api_path = format!("/repos/{}/contents/{}", repo_full_name, path);
        let mut body = json!({
            "message": message,
            "content": BASE64.encode(content.as_bytes()),
        });
        if let Some(sha) = sha {
            body["sha"] = Value::String(sha.to_string());
        }

        let value = self.request(token, Method::PUT, &api_path, Some(body)).await?;
        let commit_sha = value
            .get("commit")
            .and_then(|c| c.get("sha"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(commit_sha)
    }

    async fn delete_file(
        &self,
        token: &str,
        repo_full_name: &str,
        path: &str,
        sha: &str,
        message: &str,
    ) -> HostingResult<()> {
        let api_path = format!("/repos/{}/contents/{}", repo_full_name, path);
        let body = json!({ "message": message, "sha": sha });
        self.request(token, Method::DELETE, &api_path, Some(body))
            .await?;
        Ok(())
    }

    async fn enable_pages_workflow(
        &self,
        token: &str,
        repo_full_name: &str,
    ) -> HostingResult<String> {
        let api_path = format!("/repos/{}/pages", repo_full_name);
        let body = json!({ "build_type": "workflow" });
        self.request(token, Method::POST, &api_path, Some(body))
            .await?;

        // The pages URL is predictable; derive it instead of trusting the
        // response shape.
        Ok(super::pages_url(repo_full_name))
    }

    async fn fetch_authenticated_user(&self, token: &str) -> HostingResult<HostingUser> {
        let value = self.request(token, Method::GET, "/user", None).await?;
        parse(value, "user")
    }

    async fn fetch_user_emails(&self, token: &str) -> Option<Vec<HostingEmail>> {
        match self.request(token, Method::GET, "/user/emails", None).await {
            Ok(value) => parse(value, "emails").ok(),
            Err(e) => {
                tracing::debug!("fetching user emails failed (ignored): {}", e);
                None
            }
        }
    }

    async fn validate_token(&self, token: &str) -> TokenValidation {
        match self.fetch_authenticated_user(token).await {
            Ok(_) => TokenValidation {
                is_valid: true,
                reason: None,
            },
            Err(e) => TokenValidation {
                is_valid: false,
                reason: Some(if e.status == 401 {
                    "access token is expired or revoked".to_string()
                } else {
                    e.message
                }),
            },
        }
    }
}
