//! Integration tests for the PostgreSQL template repository
//!
//! These need a database with `migrations/001_prompt_templates.sql` applied:
//!
//! ```text
//! DATABASE_URL=postgres://... cargo test --test repository_integration -- --ignored
//! ```

use prompt_service::domain::errors::PromptError;
use prompt_service::domain::repositories::{Pagination, TemplateFilter, TemplateRepository};
use prompt_service::domain::template::{Template, TemplateStatus, TemplateUpdate, Variable, Version};
use prompt_service::infrastructure::repositories::PostgresTemplateRepository;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// Set up test database connection pool
async fn setup_test_db() -> PgPool {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database")
}

/// Template with a unique name so tests can share a database
fn unique_template(tags: &[&str]) -> Template {
    Template::new(
        format!("test-{}", Uuid::new_v4()),
        "integration".to_string(),
        tags.iter().map(|t| t.to_string()).collect(),
        HashMap::from([("suite".to_string(), "repository".to_string())]),
    )
    .expect("valid template")
}

fn version(template_id: Uuid, label: &str) -> Version {
    Version::new(
        template_id,
        label.to_string(),
        "Hello {{name}}".to_string(),
        vec![Variable::required("name")],
    )
    .expect("valid version")
}

/// Clean up test data after each test
async fn cleanup(repo: &PostgresTemplateRepository, id: Uuid) {
    let _ = repo.delete(id).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_and_find_template() {
    let repo = PostgresTemplateRepository::new(setup_test_db().await);
    let template = unique_template(&["a"]);

    repo.create(&template).await.expect("create template");

    let by_id = repo
        .find_by_id(template.id())
        .await
        .expect("find by id")
        .expect("template exists");
    assert_eq!(by_id.name(), template.name());
    assert_eq!(by_id.status(), TemplateStatus::Active);
    assert_eq!(by_id.tags(), ["a".to_string()]);
    assert_eq!(
        by_id.metadata().get("suite").map(String::as_str),
        Some("repository")
    );

    let by_name = repo
        .find_by_name(template.name())
        .await
        .expect("find by name");
    assert_eq!(by_name.map(|t| t.id()), Some(template.id()));

    cleanup(&repo, template.id()).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_name_conflicts() {
    let repo = PostgresTemplateRepository::new(setup_test_db().await);
    let first = unique_template(&[]);
    repo.create(&first).await.expect("first create");

    let duplicate = Template::new(
        first.name().to_string(),
        String::new(),
        vec![],
        HashMap::new(),
    )
    .unwrap();
    let err = repo.create(&duplicate).await.unwrap_err();

    assert!(matches!(err, PromptError::Conflict(_)), "got {:?}", err);

    cleanup(&repo, first.id()).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_with_version_is_atomic() {
    let repo = PostgresTemplateRepository::new(setup_test_db().await);
    let existing = unique_template(&[]);
    repo.create(&existing).await.unwrap();

    // Same name: the template insert fails, so the version must not exist either.
    let clash = Template::new(existing.name().to_string(), String::new(), vec![], HashMap::new())
        .unwrap();
    let clash_version = version(clash.id(), "v1");
    assert!(repo.create_with_version(&clash, &clash_version).await.is_err());
    assert!(repo
        .find_version_by_id(clash_version.id())
        .await
        .unwrap()
        .is_none());

    let fresh = unique_template(&[]);
    let v1 = version(fresh.id(), "v1");
    let stored = repo.create_with_version(&fresh, &v1).await.unwrap();
    assert_eq!(stored.current_version_id(), Some(v1.id()));

    let found = repo.find_version(fresh.id(), "v1").await.unwrap().unwrap();
    assert_eq!(found.variables(), [Variable::required("name")]);

    cleanup(&repo, existing.id()).await;
    cleanup(&repo, fresh.id()).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_versions_promote_and_conflict() {
    let repo = PostgresTemplateRepository::new(setup_test_db().await);
    let template = unique_template(&[]);
    repo.create(&template).await.unwrap();

    let v1 = version(template.id(), "v1");
    repo.create_version(&v1).await.unwrap();
    let v2 = version(template.id(), "v2");
    repo.create_version(&v2).await.unwrap();

    let current = repo.find_by_id(template.id()).await.unwrap().unwrap();
    assert_eq!(current.current_version_id(), Some(v2.id()));

    let err = repo.create_version(&version(template.id(), "v1")).await.unwrap_err();
    assert!(matches!(err, PromptError::Conflict(_)), "got {:?}", err);

    let versions = repo.list_versions(template.id()).await.unwrap();
    let labels: Vec<&str> = versions.iter().map(Version::label).collect();
    assert_eq!(labels, vec!["v1", "v2"]);

    let pinned = repo.set_current_version(template.id(), "v1").await.unwrap();
    assert_eq!(pinned.current_version_id(), Some(v1.id()));
    assert!(matches!(
        repo.set_current_version(template.id(), "v9").await,
        Err(PromptError::NotFound(_))
    ));

    cleanup(&repo, template.id()).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_version_for_missing_template_is_not_found() {
    let repo = PostgresTemplateRepository::new(setup_test_db().await);

    let err = repo
        .create_version(&version(Uuid::new_v4(), "v1"))
        .await
        .unwrap_err();

    assert!(matches!(err, PromptError::NotFound(_)), "got {:?}", err);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_and_delete_cascade() {
    let repo = PostgresTemplateRepository::new(setup_test_db().await);
    let template = unique_template(&["x"]);
    let v1 = version(template.id(), "v1");
    repo.create_with_version(&template, &v1).await.unwrap();

    let updated = repo
        .update(
            template.id(),
            &TemplateUpdate {
                description: Some(String::new()),
                status: Some(TemplateStatus::Draft),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description(), "");
    assert_eq!(updated.status(), TemplateStatus::Draft);
    assert_eq!(updated.tags(), ["x".to_string()]);

    repo.delete(template.id()).await.unwrap();
    assert!(repo.find_version_by_id(v1.id()).await.unwrap().is_none());
    assert!(matches!(
        repo.delete(template.id()).await,
        Err(PromptError::NotFound(_))
    ));
    assert!(matches!(
        repo.update(template.id(), &TemplateUpdate::default()).await,
        Err(PromptError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_list_filters_by_unique_tag() {
    let repo = PostgresTemplateRepository::new(setup_test_db().await);
    let tag = format!("tag-{}", Uuid::new_v4());
    let first = unique_template(&[tag.as_str()]);
    let second = unique_template(&[tag.as_str(), "extra"]);
    repo.create(&first).await.unwrap();
    repo.create(&second).await.unwrap();

    let (items, total) = repo
        .list(
            &TemplateFilter {
                status: Some(TemplateStatus::Active),
                tags: vec![tag.clone()],
            },
            Pagination::new(1, 1),
        )
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id(), second.id());

    let (_, total) = repo
        .list(
            &TemplateFilter {
                status: None,
                tags: vec![tag.clone(), "extra".to_string()],
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(total, 1);

    cleanup(&repo, first.id()).await;
    cleanup(&repo, second.id()).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_long_name_and_label_are_stored() {
    let repo = PostgresTemplateRepository::new(setup_test_db().await);
    let template = Template::new(
        format!("{}-{}", "n".repeat(300), Uuid::new_v4()),
        String::new(),
        vec![],
        HashMap::new(),
    )
    .unwrap();
    let label = "release-".repeat(10);
    let long = version(template.id(), &label);

    repo.create_with_version(&template, &long)
        .await
        .expect("unbounded text columns");

    let found = repo.find_version(template.id(), &label).await.unwrap();
    assert_eq!(found.map(|v| v.id()), Some(long.id()));
    assert!(repo.find_by_name(template.name()).await.unwrap().is_some());

    cleanup(&repo, template.id()).await;
}
