use aduan_backend::{BackendError, CommunityBackend, MemoryBackend};
use aduan_feed::{
    EngagementView, FeedError, ModerationConsole, NotificationInbox, NoticeLevel, Reconciler,
    Resolution,
};
use aduan_model::{
    ActionKind, EngagementCounts, Profile, ReportCategory, ReportDraft, ReportItem, ReportStatus,
    Role,
};
use std::sync::Arc;

const HOUR_MS: u64 = 60 * 60 * 1000;

fn report(id: &str) -> ReportItem {
    ReportItem {
        id: id.to_string(),
        title: format!("report {id}"),
        description: None,
        category: ReportCategory::Other,
        status: ReportStatus::Open,
        photo_url: None,
        location: None,
        created_at_unix_ms: 1,
        creator_id: Some("owner".to_string()),
        counts: EngagementCounts::default(),
        is_hidden: false,
        is_locked: false,
    }
}

fn setup() -> (Arc<MemoryBackend>, Reconciler) {
    let backend = Arc::new(MemoryBackend::new());
    backend.insert_report(report("r1"));
    let reconciler = Reconciler::new(Arc::clone(&backend) as Arc<dyn CommunityBackend>);
    (backend, reconciler)
}

#[tokio::test]
async fn like_then_unlike_returns_to_original_count() {
    let (backend, reconciler) = setup();
    let mut view = EngagementView {
        likes: 2,
        ..EngagementView::default()
    };

    // Anonymous trigger: aborted with a login prompt.
    let res = reconciler.toggle_like(&mut view, "r1", None).await;
    assert_eq!(res, Resolution::AuthRequired);
    assert_eq!(view.likes, 2);
    assert_eq!(reconciler.drain_notices().len(), 1);

    // Signed in now.
    let res = reconciler.toggle_like(&mut view, "r1", Some("u1")).await;
    assert_eq!(res, Resolution::Committed);
    assert!(view.is_liked);
    assert_eq!(view.likes, 3);
    assert!(backend.like_exists("r1", "u1"));

    let res = reconciler.toggle_like(&mut view, "r1", Some("u1")).await;
    assert_eq!(res, Resolution::Committed);
    assert!(!view.is_liked);
    assert_eq!(view.likes, 2);
    assert!(!backend.like_exists("r1", "u1"));
}

#[tokio::test]
async fn duplicate_like_keeps_the_optimistic_state() {
    let (backend, reconciler) = setup();
    // The like already exists server-side; local view is stale.
    backend.set_like("r1", "u1", true).await.unwrap();
    let mut view = EngagementView {
        likes: 1,
        ..EngagementView::default()
    };

    let res = reconciler.toggle_like(&mut view, "r1", Some("u1")).await;
    assert_eq!(res, Resolution::DuplicateNoOp);
    // Not rolled back: the optimistic flip stands.
    assert!(view.is_liked);
    assert_eq!(view.likes, 2);
    assert!(reconciler.drain_notices().is_empty());
}

#[tokio::test]
async fn network_failure_rolls_the_like_back() {
    let (backend, reconciler) = setup();
    backend.fail_next(BackendError::Network("timeout".to_string()));
    let mut view = EngagementView {
        likes: 5,
        ..EngagementView::default()
    };

    let res = reconciler.toggle_like(&mut view, "r1", Some("u1")).await;
    assert_eq!(res, Resolution::RolledBack);
    assert!(!view.is_liked);
    assert_eq!(view.likes, 5);
    assert!(!backend.like_exists("r1", "u1"));

    let notices = reconciler.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].message, "Failed to like");
}

#[tokio::test]
async fn second_trigger_while_first_is_in_flight_is_ignored() {
    let (backend, reconciler) = setup();
    let reconciler = Arc::new(reconciler);
    let gate = backend.hold_next();

    let worker = Arc::clone(&reconciler);
    let first = tokio::spawn(async move {
        let mut view = EngagementView::default();
        let res = worker.toggle_like(&mut view, "r1", Some("u1")).await;
        (res, view)
    });
    tokio::task::yield_now().await;
    assert!(reconciler.is_pending("r1", ActionKind::Like, "u1"));

    // Same key while the write is held in flight: dropped untouched.
    let mut view = EngagementView::default();
    let res = reconciler.toggle_like(&mut view, "r1", Some("u1")).await;
    assert_eq!(res, Resolution::Ignored);
    assert!(!view.is_liked);
    assert_eq!(view.likes, 0);

    // A different key is not blocked.
    let res = reconciler.toggle_like(&mut view, "r1", Some("u2")).await;
    assert_eq!(res, Resolution::Committed);

    gate.notify_one();
    let (res, view) = first.await.unwrap();
    assert_eq!(res, Resolution::Committed);
    assert!(view.is_liked);
    assert!(!reconciler.is_pending("r1", ActionKind::Like, "u1"));
}

#[tokio::test]
async fn confirm_is_one_shot_and_duplicate_safe() {
    let (backend, reconciler) = setup();
    let mut view = EngagementView::default();

    let res = reconciler.confirm(&mut view, "r1", Some("u1")).await;
    assert_eq!(res, Resolution::Committed);
    assert!(view.has_confirmed);
    assert_eq!(view.confirmations, 1);

    // Second local trigger is dropped without a write.
    let res = reconciler.confirm(&mut view, "r1", Some("u1")).await;
    assert_eq!(res, Resolution::Ignored);
    assert_eq!(view.confirmations, 1);

    // Fresh view (say, after reload) hitting an existing confirmation:
    // marked confirmed, not double-counted.
    let mut fresh = EngagementView {
        confirmations: 1,
        ..EngagementView::default()
    };
    let res = reconciler.confirm(&mut fresh, "r1", Some("u1")).await;
    assert_eq!(res, Resolution::DuplicateNoOp);
    assert!(fresh.has_confirmed);
    assert_eq!(fresh.confirmations, 1);
    drop(backend);
}

#[tokio::test]
async fn sixth_comment_in_the_hour_is_rejected_locally() {
    let (backend, reconciler) = setup();
    let target = report("r1");
    let mut view = EngagementView::default();

    for i in 0..5 {
        let res = reconciler
            .post_comment(
                &mut view,
                &target,
                Some("u1"),
                &format!("comment {i}"),
                backend.now_ms(),
            )
            .await;
        assert_eq!(res, Resolution::Committed);
    }
    assert_eq!(view.comments.len(), 5);
    reconciler.drain_notices();

    let res = reconciler
        .post_comment(&mut view, &target, Some("u1"), "one too many", backend.now_ms())
        .await;
    assert_eq!(res, Resolution::RateLimited);
    // No create request went out.
    assert_eq!(backend.comment_count("r1"), 5);

    let notices = reconciler.drain_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("Rate limit exceeded"));

    // Outside the rolling window the same user posts again.
    backend.advance_ms(HOUR_MS + 1);
    let res = reconciler
        .post_comment(&mut view, &target, Some("u1"), "an hour later", backend.now_ms())
        .await;
    assert_eq!(res, Resolution::Committed);
    assert_eq!(backend.comment_count("r1"), 6);
}

#[tokio::test]
async fn comments_prepend_newest_first() {
    let (backend, reconciler) = setup();
    let target = report("r1");
    let mut view = EngagementView::default();

    reconciler
        .post_comment(&mut view, &target, Some("u1"), "first", backend.now_ms())
        .await;
    reconciler
        .post_comment(&mut view, &target, Some("u1"), "second", backend.now_ms())
        .await;
    assert_eq!(view.comments[0].content, "second");
    assert_eq!(view.comments[1].content, "first");
}

#[tokio::test]
async fn locked_report_rejects_comments() {
    let (backend, reconciler) = setup();
    let mut target = report("r1");
    target.is_locked = true;
    let mut view = EngagementView::default();

    let res = reconciler
        .post_comment(&mut view, &target, Some("u1"), "hello", backend.now_ms())
        .await;
    assert_eq!(res, Resolution::Locked);
    assert_eq!(backend.comment_count("r1"), 0);
}

#[tokio::test]
async fn fifth_report_of_the_hour_blocks_the_sixth() {
    let (backend, reconciler) = setup();
    for i in 0..5 {
        let draft = ReportDraft::new(format!("issue number {i}"), ReportCategory::Waste).unwrap();
        let (res, created) = reconciler
            .create_report(Some("u1"), &draft, backend.now_ms())
            .await;
        assert_eq!(res, Resolution::Committed);
        assert!(created.is_some());
    }

    let draft = ReportDraft::new("the one over the limit", ReportCategory::Waste).unwrap();
    let (res, created) = reconciler
        .create_report(Some("u1"), &draft, backend.now_ms())
        .await;
    assert_eq!(res, Resolution::RateLimited);
    assert!(created.is_none());
}

#[tokio::test]
async fn flagging_twice_is_benign() {
    let (_backend, reconciler) = setup();

    let res = reconciler.flag("r1", Some("u1"), "spam").await;
    assert_eq!(res, Resolution::Committed);

    let res = reconciler.flag("r1", Some("u1"), "spam").await;
    assert_eq!(res, Resolution::DuplicateNoOp);

    let notices = reconciler.drain_notices();
    assert_eq!(notices[1].level, NoticeLevel::Info);
    assert!(notices[1].message.contains("already flagged"));
}

#[tokio::test]
async fn follow_toggles_on_success() {
    let (_backend, reconciler) = setup();
    let mut view = EngagementView::default();

    assert_eq!(
        reconciler.toggle_follow(&mut view, "r1", Some("u1")).await,
        Resolution::Committed
    );
    assert!(view.is_following);
    assert_eq!(
        reconciler.toggle_follow(&mut view, "r1", Some("u1")).await,
        Resolution::Committed
    );
    assert!(!view.is_following);
}

#[tokio::test]
async fn moderation_requires_the_admin_role() {
    let (backend, _reconciler) = setup();
    let console = ModerationConsole::new(Arc::clone(&backend) as Arc<dyn CommunityBackend>);

    let user = Profile::named("u1", "Aisyah");
    let err = console
        .set_status(Some(&user), "r1", ReportStatus::Acknowledged)
        .await
        .unwrap_err();
    assert_eq!(err, FeedError::AuthRequired);

    let err = console
        .set_status(None, "r1", ReportStatus::Acknowledged)
        .await
        .unwrap_err();
    assert_eq!(err, FeedError::AuthRequired);

    let admin = Profile {
        role: Role::Admin,
        ..Profile::named("a1", "Moderator")
    };
    console
        .set_status(Some(&admin), "r1", ReportStatus::Acknowledged)
        .await
        .unwrap();
    assert_eq!(
        backend.fetch_report("r1").await.unwrap().status,
        ReportStatus::Acknowledged
    );

    console.set_hidden(Some(&admin), "r1", true).await.unwrap();
    assert!(backend.fetch_report("r1").await.unwrap().is_hidden);
}

#[tokio::test]
async fn inbox_marks_read_optimistically() {
    let (backend, _reconciler) = setup();
    backend.upsert_profile(Profile::named("u1", "Aisyah"));
    backend.set_like("r1", "u1", true).await.unwrap();
    backend.add_comment("r1", "u1", "same here").await.unwrap();

    let mut inbox = NotificationInbox::new(Arc::clone(&backend) as Arc<dyn CommunityBackend>, "owner");
    inbox.refresh().await.unwrap();
    assert_eq!(inbox.items().len(), 2);
    assert_eq!(inbox.unread_count(), 2);

    let first_id = inbox.items()[0].id.clone();
    inbox.mark_read(&first_id).await;
    assert_eq!(inbox.unread_count(), 1);

    inbox.mark_all_read().await;
    assert_eq!(inbox.unread_count(), 0);

    // Server state followed along.
    inbox.refresh().await.unwrap();
    assert_eq!(inbox.unread_count(), 0);
}

#[tokio::test]
async fn ban_notifies_the_banned_user() {
    let (backend, _reconciler) = setup();
    backend.upsert_profile(Profile::named("u1", "Aisyah"));
    let console = ModerationConsole::new(Arc::clone(&backend) as Arc<dyn CommunityBackend>);
    let admin = Profile {
        role: Role::Admin,
        ..Profile::named("a1", "Moderator")
    };
    console.ban_user(Some(&admin), "u1", true).await.unwrap();

    assert!(backend.profile("u1").unwrap().is_banned);
    let mut inbox = NotificationInbox::new(Arc::clone(&backend) as Arc<dyn CommunityBackend>, "u1");
    inbox.refresh().await.unwrap();
    assert_eq!(inbox.items().len(), 1);
    assert_eq!(
        inbox.items()[0].kind,
        aduan_model::NotificationKind::Ban
    );
}
