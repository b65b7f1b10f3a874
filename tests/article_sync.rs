//! Article synchronization tests: publish, import and best-effort delete
//! against a mock hosting provider.

mod common;

use std::sync::Arc;

use sea_orm::EntityTrait;

use pagesmith::db::entities::article;
use pagesmith::db::init_in_memory;
use pagesmith::services::ArticleService;

use common::{seed_article, seed_integration, seed_site, seed_user, MockHosting};

#[tokio::test]
async fn publish_is_idempotent_and_marks_published() {
    let db = init_in_memory().await.unwrap();
    let mock = Arc::new(MockHosting::new());
    let user = seed_user(&db, "alice").await;
    seed_integration(&db, user.id, "tok").await;
    let site = seed_site(&db, user.id, "blog", Some("alice/blog")).await;
    let row = seed_article(&db, site.id, "Hello World", "hello-world", "# Hi\n\nbody").await;

    let service = ArticleService::new(db.clone(), mock.clone());

    let first = service.publish_article(user.id, row.id).await.unwrap();
    assert!(first.published);
    assert!(!first.was_update);
    assert_eq!(first.file_path, "content/hello-world.md");

    let second = service.publish_article(user.id, row.id).await.unwrap();
    assert!(second.was_update);
    assert_eq!(second.file_path, first.file_path);

    let stored = article::Entity::find_by_id(row.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, "published");

    // The hosted file carries the front matter block followed by the body.
    let hosted = mock.file_content("content/hello-world.md").unwrap();
    assert!(hosted.starts_with("---\ntitle: Hello World\n"));
    assert!(hosted.ends_with("# Hi\n\nbody"));

    let puts = mock.puts.lock();
    assert_eq!(puts[0].message, "Add article: hello-world");
    assert_eq!(puts[1].message, "Update article: hello-world");
}

#[tokio::test]
async fn import_skips_existing_slugs_but_counts_them() {
    let db = init_in_memory().await.unwrap();
    let mock = Arc::new(MockHosting::new());
    let user = seed_user(&db, "alice").await;
    seed_integration(&db, user.id, "tok").await;
    let site = seed_site(&db, user.id, "blog", Some("alice/blog")).await;
    let existing = seed_article(&db, site.id, "Kept", "first-post", "local content").await;

    mock.seed_file(
        "content/first-post.md",
        "---\ntitle: Remote Title\n---\n\nremote content",
    );
    mock.seed_file(
        "content/second-post.md",
        "---\ntitle: Second\nstatus: draft\n---\n\ndraft body",
    );
    mock.seed_file("content/bare.md", "just a body, no front matter");
    mock.seed_file("content/notes.txt", "not markdown");
    mock.seed_file("README.md", "outside content/");

    let service = ArticleService::new(db.clone(), mock.clone());
    let report = service
        .import_articles_from_repo(user.id, site.id)
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.imported, 2);

    // The pre-existing article was left untouched.
    let kept = article::Entity::find_by_id(existing.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.content, "local content");
    assert_eq!(kept.title, "Kept");

    let mut slugs: Vec<String> = report.articles.iter().map(|a| a.slug.clone()).collect();
    slugs.sort();
    assert_eq!(slugs, vec!["bare", "second-post"]);

    let bare = report.articles.iter().find(|a| a.slug == "bare").unwrap();
    assert_eq!(bare.title, "Bare");
    assert_eq!(bare.status, "published");
    assert_eq!(bare.content, "just a body, no front matter");

    let draft = report
        .articles
        .iter()
        .find(|a| a.slug == "second-post")
        .unwrap();
    assert_eq!(draft.status, "draft");
    assert_eq!(draft.content, "draft body");
}

#[tokio::test]
async fn import_skips_files_that_fail_to_fetch() {
    let db = init_in_memory().await.unwrap();
    let mock = Arc::new(MockHosting::new());
    let user = seed_user(&db, "alice").await;
    seed_integration(&db, user.id, "tok").await;
    let site = seed_site(&db, user.id, "blog", Some("alice/blog")).await;

    mock.seed_file("content/good.md", "---\ntitle: Good\n---\n\nbody");
    mock.seed_file("content/broken.md", "---\ntitle: Broken\n---\n\nbody");
    mock.seed_file("content/also-good.md", "another body");
    mock.fail_get(
        "content/broken.md",
        pagesmith::hosting::HostingError::new(500, "Internal Server Error"),
    );

    let service = ArticleService::new(db.clone(), mock.clone());
    let report = service
        .import_articles_from_repo(user.id, site.id)
        .await
        .unwrap();

    // The failing file is counted but skipped; the batch never errors.
    assert_eq!(report.total, 3);
    assert_eq!(report.imported, 2);
    let mut slugs: Vec<String> = report.articles.iter().map(|a| a.slug.clone()).collect();
    slugs.sort();
    assert_eq!(slugs, vec!["also-good", "good"]);

    // The failure left nothing behind in the database.
    let stored = article::Entity::find()
        .all(&db)
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn import_is_repeat_safe() {
    let db = init_in_memory().await.unwrap();
    let mock = Arc::new(MockHosting::new());
    let user = seed_user(&db, "alice").await;
    seed_integration(&db, user.id, "tok").await;
    let site = seed_site(&db, user.id, "blog", Some("alice/blog")).await;

    mock.seed_file("content/post.md", "---\ntitle: Post\n---\n\nbody");

    let service = ArticleService::new(db.clone(), mock.clone());
    let first = service.import_articles_from_repo(user.id, site.id).await.unwrap();
    assert_eq!(first.imported, 1);

    let second = service.import_articles_from_repo(user.id, site.id).await.unwrap();
    assert_eq!(second.imported, 0);
    assert_eq!(second.total, 1);
}

#[tokio::test]
async fn delete_then_publish_scenario() {
    let db = init_in_memory().await.unwrap();
    let mock = Arc::new(MockHosting::new());
    let user = seed_user(&db, "alice").await;
    seed_integration(&db, user.id, "tok").await;
    let site = seed_site(&db, user.id, "blog", Some("alice/blog")).await;
    let row = seed_article(&db, site.id, "Post", "my-post", "body").await;

    let service = ArticleService::new(db.clone(), mock.clone());

    // Never published: a missing hosted file is a success-shaped no-op.
    let report = service.delete_article_from_repo(user.id, row.id).await.unwrap();
    assert!(!report.deleted);
    assert_eq!(report.reason.as_deref(), Some("File not found"));

    service.publish_article(user.id, row.id).await.unwrap();

    let report = service.delete_article_from_repo(user.id, row.id).await.unwrap();
    assert!(report.deleted);
    assert_eq!(report.file_path.as_deref(), Some("content/my-post.md"));
    assert!(mock.file_content("content/my-post.md").is_none());
}

#[tokio::test]
async fn repo_delete_without_linked_repo_is_a_no_op() {
    let db = init_in_memory().await.unwrap();
    let mock = Arc::new(MockHosting::new());
    let user = seed_user(&db, "alice").await;
    let site = seed_site(&db, user.id, "blog", None).await;
    let row = seed_article(&db, site.id, "Post", "my-post", "body").await;

    // No integration seeded: the no-repo path must not try to resolve a token.
    let service = ArticleService::new(db.clone(), mock.clone());
    let report = service.delete_article_from_repo(user.id, row.id).await.unwrap();
    assert!(!report.deleted);
    assert_eq!(report.reason.as_deref(), Some("no linked repository"));
}

#[tokio::test]
async fn database_delete_proceeds_when_hosted_delete_fails() {
    let db = init_in_memory().await.unwrap();
    let mock = Arc::new(MockHosting::new());
    let user = seed_user(&db, "alice").await;
    seed_integration(&db, user.id, "tok").await;
    let site = seed_site(&db, user.id, "blog", Some("alice/blog")).await;
    let row = seed_article(&db, site.id, "Post", "my-post", "body").await;

    // An invalid token makes the hosted-side delete fail; the row still goes.
    mock.token_valid.store(false, std::sync::atomic::Ordering::SeqCst);

    let service = ArticleService::new(db.clone(), mock.clone());
    let report = service.delete_article(user.id, row.id).await.unwrap();
    assert!(report.deleted);
    assert!(report.repo.is_none());
    assert!(report.repo_error.is_some());

    assert!(article::Entity::find_by_id(row.id)
        .one(&db)
        .await
        .unwrap()
        .is_none());
}
