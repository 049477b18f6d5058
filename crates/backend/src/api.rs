use crate::error::Result;
use aduan_model::{
    ActionKind, Comment, FeedFilter, Notification, ReportDraft, ReportItem, ReportStatus,
};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Data-access capability the feed components are built against.
///
/// Every operation maps to one backend write or read; the hosted
/// service behind it is opaque and substitutable. Implementations are
/// injected explicitly, never reached through a global client.
#[async_trait]
pub trait CommunityBackend: Send + Sync {
    /// Fetch one page of visible reports, newest first, matching the
    /// filter. Hidden reports are excluded server-side.
    async fn fetch_page(
        &self,
        filter: &FeedFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ReportItem>>;

    async fn fetch_report(&self, report_id: &str) -> Result<ReportItem>;

    /// Record or remove a like. Adding twice fails with `Duplicate`;
    /// removing an absent like is a no-op.
    async fn set_like(&self, report_id: &str, user_id: &str, add: bool) -> Result<()>;

    /// Record a "this is fixed" confirmation. One per user per report;
    /// a second attempt fails with `Duplicate`.
    async fn add_confirmation(&self, report_id: &str, user_id: &str) -> Result<()>;

    async fn set_follow(&self, report_id: &str, user_id: &str, add: bool) -> Result<()>;

    async fn add_comment(&self, report_id: &str, user_id: &str, content: &str) -> Result<Comment>;

    /// Flag a report for moderator review. Duplicate per (user, report).
    async fn add_flag(&self, report_id: &str, user_id: &str, reason: &str) -> Result<()>;

    async fn create_report(&self, user_id: &str, draft: &ReportDraft) -> Result<ReportItem>;

    /// Count the user's actions of `kind` recorded at or after
    /// `window_start_unix_ms`. Drives the client-side rate limit.
    async fn count_recent_actions(
        &self,
        user_id: &str,
        kind: ActionKind,
        window_start_unix_ms: u64,
    ) -> Result<usize>;

    async fn notifications(&self, user_id: &str) -> Result<Vec<Notification>>;

    async fn mark_notification_read(&self, notification_id: &str) -> Result<()>;

    async fn mark_all_notifications_read(&self, user_id: &str) -> Result<()>;

    // Moderation writes. Role checks happen in the caller; the hosted
    // service enforces them again through row-level rules.

    async fn set_status(&self, report_id: &str, status: ReportStatus) -> Result<()>;

    async fn set_hidden(&self, report_id: &str, hidden: bool) -> Result<()>;

    async fn set_locked(&self, report_id: &str, locked: bool) -> Result<()>;

    async fn set_banned(&self, user_id: &str, banned: bool) -> Result<()>;

    /// Subscribe to newly inserted reports. Dropping the receiver
    /// unsubscribes.
    fn subscribe_inserts(&self) -> broadcast::Receiver<ReportItem>;
}
