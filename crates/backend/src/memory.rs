use crate::api::CommunityBackend;
use crate::error::{BackendError, Result};
use aduan_model::{
    ActionKind, Comment, FeedFilter, Notification, NotificationKind, Profile, ReportDraft,
    ReportItem, ReportStatus,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Notify};

const INSERT_CHANNEL_CAPACITY: usize = 64;

/// In-memory backend double.
///
/// Serves the demo CLI and every integration test. Carries a manual
/// clock and a one-shot failure injector so rollback and rate-limit
/// paths can be driven deterministically.
pub struct MemoryBackend {
    inner: Mutex<Inner>,
    now_ms: AtomicU64,
    next_id: AtomicU64,
    inserts: broadcast::Sender<ReportItem>,
}

#[derive(Default)]
struct Inner {
    reports: Vec<ReportItem>,
    profiles: HashMap<String, Profile>,
    likes: HashSet<(String, String)>,
    confirmations: HashSet<(String, String)>,
    follows: HashSet<(String, String)>,
    flags: HashSet<(String, String)>,
    comments: Vec<Comment>,
    actions: Vec<ActionRecord>,
    notifications: Vec<Notification>,
    fail_next: Option<BackendError>,
    gate: Option<Arc<Notify>>,
}

struct ActionRecord {
    user_id: String,
    kind: ActionKind,
    at_unix_ms: u64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (inserts, _) = broadcast::channel(INSERT_CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(Inner::default()),
            // Arbitrary fixed epoch; tests advance it as needed.
            now_ms: AtomicU64::new(1_700_000_000_000),
            next_id: AtomicU64::new(1),
            inserts,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    pub fn set_now_ms(&self, now: u64) {
        self.now_ms.store(now, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta: u64) {
        self.now_ms.fetch_add(delta, Ordering::SeqCst);
    }

    /// Fail the next backend call with `err`, then recover.
    pub fn fail_next(&self, err: BackendError) {
        self.lock().fail_next = Some(err);
    }

    /// Hold the next backend call in flight until the returned handle
    /// is notified. Lets tests observe pending state deterministically.
    pub fn hold_next(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn upsert_profile(&self, profile: Profile) {
        self.lock().profiles.insert(profile.id.clone(), profile);
    }

    pub fn profile(&self, user_id: &str) -> Option<Profile> {
        self.lock().profiles.get(user_id).cloned()
    }

    /// Seed a report directly, bypassing draft validation and rate
    /// limits. Broadcasts an insert event like a real write would.
    pub fn insert_report(&self, report: ReportItem) {
        self.lock().reports.push(report.clone());
        let _ = self.inserts.send(report);
    }

    pub fn like_exists(&self, report_id: &str, user_id: &str) -> bool {
        self.lock()
            .likes
            .contains(&(report_id.to_string(), user_id.to_string()))
    }

    pub fn comment_count(&self, report_id: &str) -> usize {
        self.lock()
            .comments
            .iter()
            .filter(|c| c.report_id == report_id)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fresh_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn take_injected_failure(&self) -> Result<()> {
        match self.lock().fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Entry point of every trait method: wait out a held gate, then
    /// surface any injected failure.
    async fn checkpoint(&self) -> Result<()> {
        let gate = self.lock().gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.take_injected_failure()
    }
}

impl Inner {
    fn report_mut(&mut self, report_id: &str) -> Result<&mut ReportItem> {
        self.reports
            .iter_mut()
            .find(|r| r.id == report_id)
            .ok_or_else(|| BackendError::NotFound(report_id.to_string()))
    }

    fn record_action(&mut self, user_id: &str, kind: ActionKind, at_unix_ms: u64) {
        self.actions.push(ActionRecord {
            user_id: user_id.to_string(),
            kind,
            at_unix_ms,
        });
    }

    fn actor_name(&self, user_id: &str) -> Option<String> {
        self.profiles.get(user_id).and_then(|p| p.name.clone())
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}

#[async_trait]
impl CommunityBackend for MemoryBackend {
    async fn fetch_page(
        &self,
        filter: &FeedFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ReportItem>> {
        self.checkpoint().await?;
        let inner = self.lock();
        let mut visible: Vec<ReportItem> = inner
            .reports
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        // Stable sort keeps insertion order among equal timestamps.
        visible.sort_by(|a, b| b.created_at_unix_ms.cmp(&a.created_at_unix_ms));
        let page: Vec<ReportItem> = visible.into_iter().skip(offset).take(limit).collect();
        log::debug!("fetch_page offset={offset} limit={limit} -> {} items", page.len());
        Ok(page)
    }

    async fn fetch_report(&self, report_id: &str) -> Result<ReportItem> {
        self.checkpoint().await?;
        self.lock()
            .reports
            .iter()
            .find(|r| r.id == report_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(report_id.to_string()))
    }

    async fn set_like(&self, report_id: &str, user_id: &str, add: bool) -> Result<()> {
        self.checkpoint().await?;
        let now = self.now_ms();
        let mut inner = self.lock();
        let key = (report_id.to_string(), user_id.to_string());
        if add {
            if inner.likes.contains(&key) {
                return Err(BackendError::Duplicate);
            }
            // Resolve the report before any side effect lands.
            let (creator, title) = {
                let report = inner.report_mut(report_id)?;
                report.counts.likes += 1;
                (report.creator_id.clone(), report.title.clone())
            };
            inner.likes.insert(key);
            inner.record_action(user_id, ActionKind::Like, now);
            if let Some(creator) = creator.filter(|c| c != user_id) {
                let actor_name = inner.actor_name(user_id);
                let id = format!("n-like-{report_id}-{user_id}-{now}");
                inner.notify(Notification {
                    id,
                    user_id: creator,
                    kind: NotificationKind::Like,
                    created_at_unix_ms: now,
                    is_read: false,
                    actor_name,
                    report_id: Some(report_id.to_string()),
                    report_title: Some(title),
                });
            }
        } else if inner.likes.contains(&key) {
            let report = inner.report_mut(report_id)?;
            report.counts.likes = report.counts.likes.saturating_sub(1);
            inner.likes.remove(&key);
        }
        // Removing an absent like is not an error.
        Ok(())
    }

    async fn add_confirmation(&self, report_id: &str, user_id: &str) -> Result<()> {
        self.checkpoint().await?;
        let now = self.now_ms();
        let mut inner = self.lock();
        let key = (report_id.to_string(), user_id.to_string());
        if inner.confirmations.contains(&key) {
            return Err(BackendError::Duplicate);
        }
        inner.report_mut(report_id)?.counts.confirmations += 1;
        inner.confirmations.insert(key);
        inner.record_action(user_id, ActionKind::Confirm, now);
        Ok(())
    }

    async fn set_follow(&self, report_id: &str, user_id: &str, add: bool) -> Result<()> {
        self.checkpoint().await?;
        let mut inner = self.lock();
        let key = (report_id.to_string(), user_id.to_string());
        if add {
            inner.follows.insert(key);
        } else {
            inner.follows.remove(&key);
        }
        Ok(())
    }

    async fn add_comment(&self, report_id: &str, user_id: &str, content: &str) -> Result<Comment> {
        self.checkpoint().await?;
        let now = self.now_ms();
        let id = self.fresh_id("c");
        let mut inner = self.lock();
        let (creator, title) = {
            let report = inner.report_mut(report_id)?;
            report.counts.comments += 1;
            (report.creator_id.clone(), report.title.clone())
        };
        let comment = Comment {
            id,
            report_id: report_id.to_string(),
            author_id: user_id.to_string(),
            author_name: inner.actor_name(user_id),
            content: content.to_string(),
            created_at_unix_ms: now,
        };
        inner.comments.push(comment.clone());
        inner.record_action(user_id, ActionKind::Comment, now);
        if let Some(creator) = creator.filter(|c| c != user_id) {
            let actor_name = inner.actor_name(user_id);
            let id = format!("n-comment-{}", comment.id);
            inner.notify(Notification {
                id,
                user_id: creator,
                kind: NotificationKind::Comment,
                created_at_unix_ms: now,
                is_read: false,
                actor_name,
                report_id: Some(report_id.to_string()),
                report_title: Some(title),
            });
        }
        Ok(comment)
    }

    async fn add_flag(&self, report_id: &str, user_id: &str, _reason: &str) -> Result<()> {
        self.checkpoint().await?;
        let now = self.now_ms();
        let mut inner = self.lock();
        let key = (report_id.to_string(), user_id.to_string());
        if !inner.flags.insert(key) {
            return Err(BackendError::Duplicate);
        }
        inner.record_action(user_id, ActionKind::Flag, now);
        Ok(())
    }

    async fn create_report(&self, user_id: &str, draft: &ReportDraft) -> Result<ReportItem> {
        self.checkpoint().await?;
        let now = self.now_ms();
        let id = self.fresh_id("r");
        let report = ReportItem {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            category: draft.category,
            status: ReportStatus::Open,
            photo_url: draft.photo_url.clone(),
            location: draft.location.clone(),
            created_at_unix_ms: now,
            creator_id: Some(user_id.to_string()),
            counts: Default::default(),
            is_hidden: false,
            is_locked: false,
        };
        {
            let mut inner = self.lock();
            inner.reports.push(report.clone());
            inner.record_action(user_id, ActionKind::Report, now);
        }
        let _ = self.inserts.send(report.clone());
        Ok(report)
    }

    async fn count_recent_actions(
        &self,
        user_id: &str,
        kind: ActionKind,
        window_start_unix_ms: u64,
    ) -> Result<usize> {
        self.checkpoint().await?;
        Ok(self
            .lock()
            .actions
            .iter()
            .filter(|a| {
                a.user_id == user_id && a.kind == kind && a.at_unix_ms >= window_start_unix_ms
            })
            .count())
    }

    async fn notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        self.checkpoint().await?;
        let mut list: Vec<Notification> = self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at_unix_ms.cmp(&a.created_at_unix_ms));
        Ok(list)
    }

    async fn mark_notification_read(&self, notification_id: &str) -> Result<()> {
        self.checkpoint().await?;
        let mut inner = self.lock();
        if let Some(n) = inner
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
        {
            n.is_read = true;
        }
        Ok(())
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> Result<()> {
        self.checkpoint().await?;
        let mut inner = self.lock();
        for n in inner.notifications.iter_mut() {
            if n.user_id == user_id {
                n.is_read = true;
            }
        }
        Ok(())
    }

    async fn set_status(&self, report_id: &str, status: ReportStatus) -> Result<()> {
        self.checkpoint().await?;
        let now = self.now_ms();
        let mut inner = self.lock();
        let (creator, title) = {
            let report = inner.report_mut(report_id)?;
            report.status = status;
            (report.creator_id.clone(), report.title.clone())
        };
        if let Some(creator) = creator {
            let id = format!("n-status-{report_id}-{now}");
            inner.notify(Notification {
                id,
                user_id: creator,
                kind: NotificationKind::StatusChange,
                created_at_unix_ms: now,
                is_read: false,
                actor_name: None,
                report_id: Some(report_id.to_string()),
                report_title: Some(title),
            });
        }
        Ok(())
    }

    async fn set_hidden(&self, report_id: &str, hidden: bool) -> Result<()> {
        self.checkpoint().await?;
        self.lock().report_mut(report_id)?.is_hidden = hidden;
        Ok(())
    }

    async fn set_locked(&self, report_id: &str, locked: bool) -> Result<()> {
        self.checkpoint().await?;
        self.lock().report_mut(report_id)?.is_locked = locked;
        Ok(())
    }

    async fn set_banned(&self, user_id: &str, banned: bool) -> Result<()> {
        self.checkpoint().await?;
        let now = self.now_ms();
        let mut inner = self.lock();
        if let Some(profile) = inner.profiles.get_mut(user_id) {
            profile.is_banned = banned;
        }
        if banned {
            let id = format!("n-ban-{user_id}-{now}");
            inner.notify(Notification {
                id,
                user_id: user_id.to_string(),
                kind: NotificationKind::Ban,
                created_at_unix_ms: now,
                is_read: false,
                actor_name: None,
                report_id: None,
                report_title: None,
            });
        }
        Ok(())
    }

    fn subscribe_inserts(&self) -> broadcast::Receiver<ReportItem> {
        self.inserts.subscribe()
    }
}
