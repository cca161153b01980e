mod common;

use common::{identity, TestApp};
use video_core::{CatalogSort, SortDirection, SortField};
use video_service::services::CatalogQuery;
use video_service::ErrorKind;

#[tokio::test]
async fn search_matches_title_or_description_sorted_by_views() {
    let app = TestApp::new();
    let owner = identity(&app.register("owner").await);
    let viewer = identity(&app.register("viewer").await);

    let a = app.publish(&owner, "Funny CATS", "compilation").await;
    let b = app.publish(&owner, "Morning routine", "feeding the cat").await;
    let c = app.publish(&owner, "Concatenate strings", "a rust tutorial").await;
    let dogs = app.publish(&owner, "Dogs", "only dogs here").await;

    let videos = &app.state.videos;
    videos.record_view(&viewer, a.id).await.unwrap();
    videos.record_view(&viewer, b.id).await.unwrap();
    videos.record_view(&owner, b.id).await.unwrap();
    videos.record_view(&viewer, dogs.id).await.unwrap();

    let page = app
        .state
        .catalog
        .search(
            None,
            CatalogQuery {
                text: Some("cat".to_string()),
                sort: CatalogSort::new(SortField::Views, SortDirection::Desc),
                page: 1,
                page_size: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let ids: Vec<_> = page.items.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![b.id, a.id, c.id]);
    assert_eq!(page.total_items, 3);
    assert_eq!(page.total_pages, 1);
    assert!(!page.has_next);
    assert!(page.items.iter().all(|v| v.owner.username == "owner"));
}

#[tokio::test]
async fn default_order_is_newest_first_and_pages_are_stable() {
    let app = TestApp::new();
    let owner = identity(&app.register("owner").await);

    let mut published = Vec::new();
    for i in 0..5 {
        published.push(app.publish(&owner, &format!("Video {i}"), "desc").await.id);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    published.reverse();

    let catalog = &app.state.catalog;
    let first = catalog
        .search(
            None,
            CatalogQuery {
                page: 1,
                page_size: 2,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let second = catalog
        .search(
            None,
            CatalogQuery {
                page: 2,
                page_size: 2,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let third = catalog
        .search(
            None,
            CatalogQuery {
                page: 3,
                page_size: 2,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let seen: Vec<_> = first
        .items
        .iter()
        .chain(&second.items)
        .chain(&third.items)
        .map(|v| v.id)
        .collect();
    assert_eq!(seen, published);
    assert!(first.has_next && second.has_next && !third.has_next);
    assert_eq!(first.total_pages, 3);
}

#[tokio::test]
async fn page_beyond_results_is_empty() {
    let app = TestApp::new();
    let owner = identity(&app.register("owner").await);
    app.publish(&owner, "Only one", "desc").await;

    let page = app
        .state
        .catalog
        .search(
            None,
            CatalogQuery {
                page: 9,
                page_size: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 1);
    assert!(!page.has_next);
}

#[tokio::test]
async fn invalid_paging_and_clamping() {
    let app = TestApp::new();

    let err = app
        .state
        .catalog
        .search(
            None,
            CatalogQuery {
                page_size: 0,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let page = app
        .state
        .catalog
        .search(
            None,
            CatalogQuery {
                page_size: 1000,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.page_size, 100);
}

#[tokio::test]
async fn drafts_visible_only_in_owner_listing() {
    let app = TestApp::new();
    let owner = identity(&app.register("owner").await);
    let other = identity(&app.register("other").await);

    let public = app.publish(&owner, "Public", "desc").await;
    let draft = app.publish(&owner, "Draft", "desc").await;
    app.state.videos.toggle_publish(&owner, draft.id).await.unwrap();

    let query = CatalogQuery {
        owner_id: Some(owner.account_id),
        include_unpublished: true,
        ..Default::default()
    };

    let own = app
        .state
        .catalog
        .search(Some(owner.account_id), query.clone())
        .await
        .unwrap();
    assert_eq!(own.total_items, 2);

    let foreign = app
        .state
        .catalog
        .search(Some(other.account_id), query)
        .await
        .unwrap();
    let ids: Vec<_> = foreign.items.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![public.id]);
}
