//! Shared test fixtures: a scripted mock hosting provider and database
//! seeding helpers.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};

use pagesmith::db::entities::{article, git_integration, site, user};
use pagesmith::db::now_timestamp;
use pagesmith::hosting::{
    GitHostingProvider, HostingEmail, HostingError, HostingResult, HostingUser, ProvisionedRepo,
    RemoteFile, TokenValidation, TreeEntry,
};

/// One recorded `put_file` call.
#[derive(Debug, Clone)]
pub struct PutRecord {
    pub path: String,
    pub content: String,
    pub message: String,
    pub sha: Option<String>,
}

/// In-memory hosting provider holding a single repository's files, with
/// scripted tree-listing failures and recorded writes.
pub struct MockHosting {
    /// path -> (content, blob sha)
    pub files: Mutex<BTreeMap<String, (String, String)>>,
    /// Errors returned by successive `list_tree` calls before the listing
    /// starts succeeding.
    pub tree_failures: Mutex<VecDeque<HostingError>>,
    /// Paths whose `get_file` calls fail with the given error.
    pub get_failures: Mutex<HashMap<String, HostingError>>,
    pub tree_calls: AtomicU32,
    pub puts: Mutex<Vec<PutRecord>>,
    pub deletes: Mutex<Vec<String>>,
    pub token_valid: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_pages: AtomicBool,
    sha_counter: AtomicU32,
}

impl Default for MockHosting {
    fn default() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            tree_failures: Mutex::new(VecDeque::new()),
            get_failures: Mutex::new(HashMap::new()),
            tree_calls: AtomicU32::new(0),
            puts: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            token_valid: AtomicBool::new(true),
            fail_create: AtomicBool::new(false),
            fail_pages: AtomicBool::new(false),
            sha_counter: AtomicU32::new(0),
        }
    }
}

impl MockHosting {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_sha(&self) -> String {
        format!("blob{}", self.sha_counter.fetch_add(1, Ordering::SeqCst))
    }

    /// Seed a file as if it already existed in the repository.
    pub fn seed_file(&self, path: &str, content: &str) {
        let sha = self.next_sha();
        self.files
            .lock()
            .insert(path.to_string(), (content.to_string(), sha));
    }

    /// Script `n` consecutive tree-listing failures with the given error.
    pub fn fail_tree_times(&self, n: usize, err: HostingError) {
        let mut failures = self.tree_failures.lock();
        for _ in 0..n {
            failures.push_back(err.clone());
        }
    }

    /// Script every `get_file` for `path` to fail with the given error.
    pub fn fail_get(&self, path: &str, err: HostingError) {
        self.get_failures.lock().insert(path.to_string(), err);
    }

    pub fn file_content(&self, path: &str) -> Option<String> {
        self.files.lock().get(path).map(|(c, _)| c.clone())
    }
}

#[async_trait]
impl GitHostingProvider for MockHosting {
    async fn create_from_template(
        &self,
        _token: &str,
        _template_owner: &str,
        _template_repo: &str,
        new_name: &str,
        _description: &str,
    ) -> HostingResult<ProvisionedRepo> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(HostingError::new(
                422,
                "name already exists on this account",
            ));
        }
        Ok(ProvisionedRepo {
            id: 1,
            full_name: format!("alice/{}", new_name),
            html_url: format!("https://github.test/alice/{}", new_name),
            clone_url: format!("https://github.test/alice/{}.git", new_name),
            default_branch: "main".to_string(),
        })
    }

    async fn list_tree(
        &self,
        _token: &str,
        _repo_full_name: &str,
        _git_ref: &str,
    ) -> HostingResult<Vec<TreeEntry>> {
        self.tree_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.tree_failures.lock().pop_front() {
            return Err(err);
        }
        Ok(self
            .files
            .lock()
            .iter()
            .map(|(path, (_, sha))| TreeEntry {
                path: path.clone(),
                kind: "blob".to_string(),
                sha: sha.clone(),
            })
            .collect())
    }

    async fn get_file(
        &self,
        _token: &str,
        _repo_full_name: &str,
        path: &str,
    ) -> HostingResult<RemoteFile> {
        if let Some(err) = self.get_failures.lock().get(path) {
            return Err(err.clone());
        }
        match self.files.lock().get(path) {
            Some((content, sha)) => Ok(RemoteFile {
                content: content.clone(),
                sha: sha.clone(),
            }),
            None => Err(HostingError::new(404, "Not Found")),
        }
    }

    async fn put_file(
        &self,
        _token: &str,
        _repo_full_name: &str,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> HostingResult<String> {
        let mut files = self.files.lock();
        // GitHub rejects a create against an existing path and an update
        // against a stale sha; the mock enforces both.
        match (files.get(path), sha) {
            (Some(_), None) => {
                return Err(HostingError::new(422, "sha wasn't supplied"));
            }
            (Some((_, current)), Some(given)) if current != given => {
                return Err(HostingError::new(409, "sha does not match"));
            }
            (None, Some(_)) => {
                return Err(HostingError::new(404, "Not Found"));
            }
            _ => {}
        }
        let new_sha = self.next_sha();
        files.insert(path.to_string(), (content.to_string(), new_sha.clone()));
        drop(files);
        self.puts.lock().push(PutRecord {
            path: path.to_string(),
            content: content.to_string(),
            message: message.to_string(),
            sha: sha.map(str::to_string),
        });
        Ok(format!("commit-{}", new_sha))
    }

    async fn delete_file(
        &self,
        _token: &str,
        _repo_full_name: &str,
        path: &str,
        sha: &str,
        _message: &str,
    ) -> HostingResult<()> {
        let mut files = self.files.lock();
        match files.get(path) {
            Some((_, current)) if current == sha => {
                files.remove(path);
                self.deletes.lock().push(path.to_string());
                Ok(())
            }
            Some(_) => Err(HostingError::new(409, "sha does not match")),
            None => Err(HostingError::new(404, "Not Found")),
        }
    }

    async fn enable_pages_workflow(
        &self,
        _token: &str,
        repo_full_name: &str,
    ) -> HostingResult<String> {
        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(HostingError::new(409, "pages already enabled"));
        }
        Ok(pagesmith::hosting::pages_url(repo_full_name))
    }

    async fn fetch_authenticated_user(&self, _token: &str) -> HostingResult<HostingUser> {
        if !self.token_valid.load(Ordering::SeqCst) {
            return Err(HostingError::new(401, "Bad credentials"));
        }
        Ok(HostingUser {
            id: 7,
            login: "alice".to_string(),
            email: None,
            avatar_url: Some("https://github.test/alice.png".to_string()),
        })
    }

    async fn fetch_user_emails(&self, _token: &str) -> Option<Vec<HostingEmail>> {
        Some(vec![HostingEmail {
            email: "alice@example.com".to_string(),
            primary: true,
        }])
    }

    async fn validate_token(&self, token: &str) -> TokenValidation {
        match self.fetch_authenticated_user(token).await {
            Ok(_) => TokenValidation {
                is_valid: true,
                reason: None,
            },
            Err(_) => TokenValidation {
                is_valid: false,
                reason: Some("access token is expired or revoked".to_string()),
            },
        }
    }
}

/// Insert a user row.
pub async fn seed_user(db: &DatabaseConnection, username: &str) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(None),
        avatar_url: Set(None),
        created_at: Set(now_timestamp()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Insert a github integration with the given access token.
pub async fn seed_integration(
    db: &DatabaseConnection,
    user_id: i32,
    token: &str,
) -> git_integration::Model {
    let now = now_timestamp();
    git_integration::ActiveModel {
        user_id: Set(user_id),
        platform: Set("github".to_string()),
        platform_username: Set("alice".to_string()),
        access_token: Set(token.to_string()),
        installation_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Insert a site, optionally linked to a repository.
pub async fn seed_site(
    db: &DatabaseConnection,
    user_id: i32,
    name: &str,
    git_repo: Option<&str>,
) -> site::Model {
    let now = now_timestamp();
    site::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_string()),
        description: Set(None),
        git_repo: Set(git_repo.map(str::to_string)),
        platform: Set("github".to_string()),
        deploy_status: Set("deployed".to_string()),
        deploy_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Insert a draft article.
pub async fn seed_article(
    db: &DatabaseConnection,
    site_id: i32,
    title: &str,
    slug: &str,
    content: &str,
) -> article::Model {
    let now = now_timestamp();
    article::ActiveModel {
        site_id: Set(site_id),
        title: Set(title.to_string()),
        slug: Set(slug.to_string()),
        content: Set(content.to_string()),
        status: Set("draft".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}
