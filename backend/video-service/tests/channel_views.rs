mod common;

use common::{identity, TestApp};
use video_service::ErrorKind;

#[tokio::test]
async fn channel_profile_counts_and_viewer_flag() {
    let app = TestApp::new();
    let channel = app.register("channel").await;
    let s1 = app.register("s1").await;
    let s2 = app.register("s2").await;
    let s3 = app.register("s3").await;

    let subs = &app.state.subscriptions;
    subs.toggle(&identity(&s1), channel.id).await.unwrap();
    subs.toggle(&identity(&s2), channel.id).await.unwrap();
    subs.toggle(&identity(&channel), s3.id).await.unwrap();

    let as_s1 = app
        .state
        .channels
        .channel_profile("Channel", Some(s1.id))
        .await
        .unwrap();
    assert_eq!(as_s1.id, channel.id);
    assert_eq!(as_s1.subscribers_count, 2);
    assert_eq!(as_s1.subscribed_to_count, 1);
    assert!(as_s1.is_subscribed);

    let as_s3 = app
        .state
        .channels
        .channel_profile("channel", Some(s3.id))
        .await
        .unwrap();
    assert!(!as_s3.is_subscribed);

    let anonymous = app
        .state
        .channels
        .channel_profile("channel", None)
        .await
        .unwrap();
    assert!(!anonymous.is_subscribed);
    assert_eq!(anonymous.subscribers_count, 2);
}

#[tokio::test]
async fn channel_profile_failures() {
    let app = TestApp::new();

    let err = app
        .state
        .channels
        .channel_profile("  ", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = app
        .state
        .channels
        .channel_profile("nobody", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn watch_history_follows_history_order_with_owners() {
    let app = TestApp::new();
    let creator = identity(&app.register("creator").await);
    let viewer = identity(&app.register("viewer").await);

    let v1 = app.publish(&creator, "First", "one").await;
    let v2 = app.publish(&creator, "Second", "two").await;
    let v3 = app.publish(&creator, "Third", "three").await;

    app.state.videos.record_view(&viewer, v3.id).await.unwrap();
    app.state.videos.record_view(&viewer, v1.id).await.unwrap();

    let history = app.state.channels.watch_history(&viewer).await.unwrap();
    let ids: Vec<_> = history.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![v3.id, v1.id]);

    for entry in &history {
        assert_eq!(entry.owner.username, "creator");
        assert_eq!(entry.owner.full_name, "creator Example");
        assert!(entry.owner.avatar_url.starts_with("memory://"));
    }

    // History is append-only; a repeat view is listed again
    app.state.videos.record_view(&viewer, v3.id).await.unwrap();
    app.state.videos.record_view(&viewer, v2.id).await.unwrap();
    let ids: Vec<_> = app
        .state
        .channels
        .watch_history(&viewer)
        .await
        .unwrap()
        .iter()
        .map(|v| v.id)
        .collect();
    assert_eq!(ids, vec![v3.id, v1.id, v3.id, v2.id]);
}

#[tokio::test]
async fn watch_history_skips_deleted_videos() {
    let app = TestApp::new();
    let creator = identity(&app.register("creator").await);
    let viewer = identity(&app.register("viewer").await);

    let kept = app.publish(&creator, "Kept", "stays").await;
    let removed = app.publish(&creator, "Removed", "goes").await;
    app.state.videos.record_view(&viewer, kept.id).await.unwrap();
    app.state.videos.record_view(&viewer, removed.id).await.unwrap();

    app.state.videos.delete(&creator, removed.id).await.unwrap();

    let history = app.state.channels.watch_history(&viewer).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, kept.id);
    assert_eq!(history[0].views, 1);
}

#[tokio::test]
async fn empty_watch_history() {
    let app = TestApp::new();
    let viewer = identity(&app.register("viewer").await);

    assert!(app
        .state
        .channels
        .watch_history(&viewer)
        .await
        .unwrap()
        .is_empty());
}
