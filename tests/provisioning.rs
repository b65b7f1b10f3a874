//! Repository provisioning workflow tests: retry protocol, placeholder
//! substitution and error classification.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use pagesmith::error::ServiceError;
use pagesmith::hosting::HostingError;
use pagesmith::provision::{ProvisionRequest, RepositoryProvisioner, TemplateData};

use common::MockHosting;

fn request() -> ProvisionRequest {
    ProvisionRequest {
        name: "my-blog".to_string(),
        description: "A test blog".to_string(),
        template_owner: "pagesmith-templates".to_string(),
        template_repo: "starter-site".to_string(),
    }
}

fn template_data() -> TemplateData {
    TemplateData {
        site_name: "My Blog".to_string(),
        description: "A test blog".to_string(),
        author: "Alice".to_string(),
        github_username: "alice".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn provision_substitutes_placeholders_and_enables_pages() {
    let mock = Arc::new(MockHosting::new());
    mock.seed_file("index.html", "<h1>{{SITE_NAME}}</h1> by {{AUTHOR}}");
    mock.seed_file("config.yml", "slug: {{SITE_SLUG}}\nuser: {{GITHUB_USERNAME}}");
    mock.seed_file("plain.md", "no placeholders here");
    mock.seed_file("logo.png", "{{SITE_NAME}} inside a binary path");

    let provisioner = RepositoryProvisioner::new(mock.clone());
    let outcome = provisioner
        .provision("tok", &request(), Some(&template_data()))
        .await
        .unwrap();

    assert_eq!(outcome.repo.full_name, "alice/my-blog");
    assert_eq!(outcome.pages_url, "https://alice.github.io/my-blog");

    assert_eq!(
        mock.file_content("index.html").unwrap(),
        "<h1>My Blog</h1> by Alice"
    );
    assert_eq!(
        mock.file_content("config.yml").unwrap(),
        "slug: my-blog\nuser: alice"
    );

    // Unchanged and non-text files are never written back.
    let puts = mock.puts.lock();
    assert_eq!(puts.len(), 2);
    assert!(puts.iter().all(|p| p.message == "Configure site from template"));
    assert!(puts.iter().all(|p| p.sha.is_some()));
    assert!(!puts.iter().any(|p| p.path == "plain.md" || p.path == "logo.png"));
}

#[tokio::test(start_paused = true)]
async fn tree_listing_retries_through_nine_failures() {
    let mock = Arc::new(MockHosting::new());
    mock.fail_tree_times(9, HostingError::new(409, "Conflict"));
    mock.seed_file("index.html", "{{SITE_NAME}}");

    let provisioner = RepositoryProvisioner::new(mock.clone());
    let outcome = provisioner
        .provision("tok", &request(), Some(&template_data()))
        .await
        .unwrap();

    assert_eq!(outcome.repo.full_name, "alice/my-blog");
    // 9 failed attempts plus the succeeding tenth.
    assert_eq!(mock.tree_calls.load(Ordering::SeqCst), 10);
    assert_eq!(mock.file_content("index.html").unwrap(), "My Blog");
}

#[tokio::test(start_paused = true)]
async fn tree_listing_gives_up_after_ten_failures() {
    let mock = Arc::new(MockHosting::new());
    mock.fail_tree_times(10, HostingError::new(409, "Conflict"));

    let provisioner = RepositoryProvisioner::new(mock.clone());
    let err = provisioner
        .provision("tok", &request(), Some(&template_data()))
        .await
        .unwrap_err();

    match err {
        ServiceError::RepositoryCreation { repo_name, reason } => {
            assert_eq!(repo_name, "alice/my-blog");
            assert!(reason.contains("placeholder substitution failed"));
        }
        other => panic!("expected RepositoryCreation, got {:?}", other),
    }
    // No eleventh attempt.
    assert_eq!(mock.tree_calls.load(Ordering::SeqCst), 10);
}

#[tokio::test(start_paused = true)]
async fn non_transient_tree_failure_is_fatal_immediately() {
    let mock = Arc::new(MockHosting::new());
    mock.fail_tree_times(1, HostingError::new(401, "Bad credentials"));

    let provisioner = RepositoryProvisioner::new(mock.clone());
    let err = provisioner
        .provision("tok", &request(), Some(&template_data()))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::RepositoryCreation { .. }));
    assert_eq!(mock.tree_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn empty_repository_message_is_retried() {
    let mock = Arc::new(MockHosting::new());
    mock.fail_tree_times(2, HostingError::new(500, "Git Repository is empty."));

    let provisioner = RepositoryProvisioner::new(mock.clone());
    provisioner
        .provision("tok", &request(), Some(&template_data()))
        .await
        .unwrap();

    assert_eq!(mock.tree_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn creation_failure_is_distinguished_from_pages_failure() {
    let mock = Arc::new(MockHosting::new());
    mock.fail_create.store(true, Ordering::SeqCst);

    let provisioner = RepositoryProvisioner::new(mock.clone());
    let err = provisioner.provision("tok", &request(), None).await.unwrap_err();
    match err {
        ServiceError::RepositoryCreation { repo_name, .. } => {
            assert_eq!(repo_name, "my-blog");
        }
        other => panic!("expected RepositoryCreation, got {:?}", other),
    }

    let mock = Arc::new(MockHosting::new());
    mock.fail_pages.store(true, Ordering::SeqCst);

    let provisioner = RepositoryProvisioner::new(mock.clone());
    let err = provisioner.provision("tok", &request(), None).await.unwrap_err();
    match err {
        ServiceError::PagesDeployment { repo_name, .. } => {
            // The repository was created; the error names it so the caller
            // can tell the user to fix pages by hand.
            assert_eq!(repo_name, "alice/my-blog");
        }
        other => panic!("expected PagesDeployment, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn provision_without_template_data_skips_substitution() {
    let mock = Arc::new(MockHosting::new());
    mock.seed_file("index.html", "{{SITE_NAME}}");

    let provisioner = RepositoryProvisioner::new(mock.clone());
    provisioner.provision("tok", &request(), None).await.unwrap();

    assert_eq!(mock.tree_calls.load(Ordering::SeqCst), 0);
    assert_eq!(mock.file_content("index.html").unwrap(), "{{SITE_NAME}}");
}
