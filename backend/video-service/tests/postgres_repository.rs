//! Runs against a real PostgreSQL instance:
//! `DATABASE_URL=postgres://... cargo test -p video-service -- --ignored`

use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;
use video_core::{CatalogFilter, CatalogSort, NewVideo, PageRequest};
use video_service::models::{MediaSlot, NewAccount};
use video_service::repository::Repositories;
use video_service::AppError;

async fn repos() -> Repositories {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");
    let pool = PgPool::connect(&url).await.expect("connect to postgres");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("apply migrations");
    Repositories::postgres(pool, Duration::from_secs(5))
}

fn new_account(prefix: &str) -> NewAccount {
    let unique = format!("{prefix}{}", &Uuid::new_v4().simple().to_string()[..12]);
    NewAccount {
        username: unique.clone(),
        email: format!("{unique}@Example.com"),
        full_name: prefix.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        avatar_url: format!("https://cdn.example.com/{unique}.png"),
        cover_url: None,
    }
}

#[tokio::test]
#[ignore]
async fn account_constraints_and_token_swap() {
    let repos = repos().await;
    let request = new_account("Alice");
    let account = repos.accounts.insert(request.clone()).await.unwrap();
    assert_eq!(account.username, request.username.to_lowercase());
    assert_eq!(account.email, request.email.to_lowercase());

    let err = repos.accounts.insert(request).await.unwrap_err();
    assert!(matches!(err, AppError::UsernameAlreadyExists));

    repos
        .accounts
        .set_refresh_token_hash(account.id, Some("a".repeat(64)))
        .await
        .unwrap();
    assert!(repos
        .accounts
        .swap_refresh_token_hash(account.id, &"a".repeat(64), &"b".repeat(64))
        .await
        .unwrap());
    assert!(!repos
        .accounts
        .swap_refresh_token_hash(account.id, &"a".repeat(64), &"c".repeat(64))
        .await
        .unwrap());

    let replaced = repos
        .accounts
        .replace_media(account.id, MediaSlot::Avatar, "https://cdn.example.com/new.png")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(replaced.previous_url, Some(account.avatar_url));
    assert_eq!(replaced.account.avatar_url, "https://cdn.example.com/new.png");
}

#[tokio::test]
#[ignore]
async fn subscription_constraints_back_the_toggle() {
    let repos = repos().await;
    let a = repos.accounts.insert(new_account("sub")).await.unwrap();
    let b = repos.accounts.insert(new_account("chan")).await.unwrap();

    repos.subscriptions.insert_edge(a.id, b.id).await.unwrap();
    assert!(matches!(
        repos.subscriptions.insert_edge(a.id, b.id).await,
        Err(AppError::DuplicateSubscription)
    ));
    assert!(matches!(
        repos.subscriptions.insert_edge(a.id, a.id).await,
        Err(AppError::SelfSubscription)
    ));

    let counts = repos.subscriptions.subscriber_counts(&[a.id, b.id]).await.unwrap();
    assert_eq!(counts.get(&b.id), Some(&1));
    assert_eq!(counts.get(&a.id), None);

    assert!(repos.subscriptions.delete_edge(a.id, b.id).await.unwrap());
    assert!(!repos.subscriptions.delete_edge(a.id, b.id).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn catalog_search_escapes_like_patterns() {
    let repos = repos().await;
    let owner = repos.accounts.insert(new_account("owner")).await.unwrap();

    for title in ["100% fresh", "100 percent", "snake_case tips"] {
        repos
            .videos
            .insert(NewVideo {
                owner_id: owner.id,
                title: title.to_string(),
                description: "desc".to_string(),
                video_url: "https://cdn.example.com/v.mp4".to_string(),
                thumbnail_url: "https://cdn.example.com/t.png".to_string(),
                duration: 10.0,
                is_published: true,
            })
            .await
            .unwrap();
    }

    let filter = CatalogFilter {
        text: Some("100%".to_string()),
        owner_id: Some(owner.id),
        include_unpublished: false,
    };
    let (videos, total) = repos
        .videos
        .search(&filter, CatalogSort::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(videos[0].title, "100% fresh");
}
