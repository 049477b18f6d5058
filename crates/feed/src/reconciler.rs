use crate::config::FeedTuning;
use crate::notice::Notice;
use aduan_backend::{BackendError, CommunityBackend};
use aduan_model::{ActionKind, Comment, ReportDraft, ReportItem};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

/// Pending key for actions without a report yet (report creation).
const NEW_REPORT_KEY: &str = "new";

/// Terminal state of one user action. Every action starts idle, moves
/// to pending when triggered, and resolves to one of these before the
/// key accepts another trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Backend accepted the write; local state stands.
    Committed,
    /// Backend reported the write already existed. Benign: the
    /// optimistic state is kept, nothing is rolled back.
    DuplicateNoOp,
    /// Backend failed; any optimistic change was reverted.
    RolledBack,
    /// Rejected locally by the rolling-window check; no create request
    /// was issued.
    RateLimited,
    /// No signed-in user.
    AuthRequired,
    /// The report rejects this action (locked comments).
    Locked,
    /// Dropped without effect: same key already pending, or the
    /// trigger was meaningless (empty comment, repeat confirm).
    Ignored,
}

/// Local engagement state for one report, as a detail view renders it.
/// Mutated only through [`Reconciler`] operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngagementView {
    pub is_liked: bool,
    pub likes: u64,
    pub has_confirmed: bool,
    pub confirmations: u64,
    pub is_following: bool,
    pub comments: Vec<Comment>,
}

/// Applies tentative local mutations ahead of the backend write and
/// reconciles once it answers.
///
/// Operations take `&self` so triggers can interleave through a shared
/// handle; the pending set behind the lock enforces one in-flight
/// action per (report, kind, user), and a second trigger while pending
/// resolves `Ignored`. User-visible notices accumulate in a buffer the
/// UI drains after each operation.
pub struct Reconciler {
    backend: Arc<dyn CommunityBackend>,
    tuning: FeedTuning,
    pending: Mutex<HashSet<(String, ActionKind, String)>>,
    notices: Mutex<Vec<Notice>>,
}

impl Reconciler {
    pub fn new(backend: Arc<dyn CommunityBackend>) -> Self {
        Self::with_tuning(backend, FeedTuning::default())
    }

    pub fn with_tuning(backend: Arc<dyn CommunityBackend>, tuning: FeedTuning) -> Self {
        Self {
            backend,
            tuning,
            pending: Mutex::new(HashSet::new()),
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn drain_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *lock(&self.notices))
    }

    fn push_notice(&self, notice: Notice) {
        lock(&self.notices).push(notice);
    }

    pub fn is_pending(&self, report_id: &str, kind: ActionKind, user_id: &str) -> bool {
        lock(&self.pending).contains(&(report_id.to_string(), kind, user_id.to_string()))
    }

    fn begin(&self, report_id: &str, kind: ActionKind, user_id: &str) -> bool {
        lock(&self.pending).insert((report_id.to_string(), kind, user_id.to_string()))
    }

    fn finish(&self, report_id: &str, kind: ActionKind, user_id: &str) {
        lock(&self.pending).remove(&(report_id.to_string(), kind, user_id.to_string()));
    }

    /// Toggle a like. The boolean and counter flip immediately; a
    /// backend failure reverts both. A duplicate answer means the like
    /// was already recorded, so the optimistic state is already right.
    pub async fn toggle_like(
        &self,
        view: &mut EngagementView,
        report_id: &str,
        user: Option<&str>,
    ) -> Resolution {
        let Some(user_id) = user else {
            self.push_notice(Notice::error("Please login to like"));
            return Resolution::AuthRequired;
        };
        if !self.begin(report_id, ActionKind::Like, user_id) {
            return Resolution::Ignored;
        }

        let prev_liked = view.is_liked;
        let prev_likes = view.likes;
        view.is_liked = !prev_liked;
        view.likes = if prev_liked {
            prev_likes.saturating_sub(1)
        } else {
            prev_likes + 1
        };

        let add = !prev_liked;
        let result = self.backend.set_like(report_id, user_id, add).await;
        self.finish(report_id, ActionKind::Like, user_id);
        match result {
            Ok(()) => Resolution::Committed,
            Err(BackendError::Duplicate) => Resolution::DuplicateNoOp,
            Err(err) => {
                view.is_liked = prev_liked;
                view.likes = prev_likes;
                log::warn!("like toggle on {report_id} rolled back: {err}");
                self.push_notice(Notice::error(if add {
                    "Failed to like"
                } else {
                    "Failed to unlike"
                }));
                Resolution::RolledBack
            }
        }
    }

    /// Confirm "this is fixed". One-shot per user, applied on success
    /// rather than optimistically. A duplicate answer marks the report
    /// confirmed without double-counting.
    pub async fn confirm(
        &self,
        view: &mut EngagementView,
        report_id: &str,
        user: Option<&str>,
    ) -> Resolution {
        let Some(user_id) = user else {
            self.push_notice(Notice::error("Please login to confirm"));
            return Resolution::AuthRequired;
        };
        if view.has_confirmed {
            return Resolution::Ignored;
        }
        if !self.begin(report_id, ActionKind::Confirm, user_id) {
            return Resolution::Ignored;
        }

        let result = self.backend.add_confirmation(report_id, user_id).await;
        self.finish(report_id, ActionKind::Confirm, user_id);
        match result {
            Ok(()) => {
                view.has_confirmed = true;
                view.confirmations += 1;
                self.push_notice(Notice::success("Thanks for confirming!"));
                if view.confirmations >= self.tuning.confirmations_to_close {
                    // Display only; the status transition is backend policy.
                    self.push_notice(Notice::success(
                        "Report confirmed fixed! Status updated.",
                    ));
                }
                Resolution::Committed
            }
            Err(BackendError::Duplicate) => {
                view.has_confirmed = true;
                Resolution::DuplicateNoOp
            }
            Err(err) => {
                log::warn!("confirmation on {report_id} failed: {err}");
                self.push_notice(Notice::error("Failed to confirm"));
                Resolution::RolledBack
            }
        }
    }

    /// Follow/unfollow toggle, applied on success.
    pub async fn toggle_follow(
        &self,
        view: &mut EngagementView,
        report_id: &str,
        user: Option<&str>,
    ) -> Resolution {
        let Some(user_id) = user else {
            self.push_notice(Notice::error("Please login to follow"));
            return Resolution::AuthRequired;
        };
        if !self.begin(report_id, ActionKind::Follow, user_id) {
            return Resolution::Ignored;
        }

        let add = !view.is_following;
        let result = self.backend.set_follow(report_id, user_id, add).await;
        self.finish(report_id, ActionKind::Follow, user_id);
        match result {
            Ok(()) => {
                view.is_following = add;
                Resolution::Committed
            }
            Err(BackendError::Duplicate) => {
                view.is_following = add;
                Resolution::DuplicateNoOp
            }
            Err(err) => {
                log::warn!("follow toggle on {report_id} failed: {err}");
                self.push_notice(Notice::error(if add {
                    "Failed to follow"
                } else {
                    "Failed to unfollow"
                }));
                Resolution::RolledBack
            }
        }
    }

    /// Post a comment. Rate limited to `rate_limit_per_hour` per
    /// rolling window; at the limit the write is rejected locally and
    /// no create request goes out (the count check is the only
    /// round-trip).
    pub async fn post_comment(
        &self,
        view: &mut EngagementView,
        report: &ReportItem,
        user: Option<&str>,
        content: &str,
        now_unix_ms: u64,
    ) -> Resolution {
        let Some(user_id) = user else {
            self.push_notice(Notice::error("Please login to post comments"));
            return Resolution::AuthRequired;
        };
        if content.trim().is_empty() {
            return Resolution::Ignored;
        }
        if report.is_locked {
            self.push_notice(Notice::error("Comments are locked on this report"));
            return Resolution::Locked;
        }
        if !self.begin(&report.id, ActionKind::Comment, user_id) {
            return Resolution::Ignored;
        }

        let resolution = self
            .rate_limited_insert(user_id, ActionKind::Comment, now_unix_ms, |backend| {
                let report_id = report.id.clone();
                let content = content.to_string();
                let user_id = user_id.to_string();
                async move { backend.add_comment(&report_id, &user_id, &content).await }
            })
            .await;
        self.finish(&report.id, ActionKind::Comment, user_id);

        match resolution {
            Ok(comment) => {
                view.comments.insert(0, comment);
                self.push_notice(Notice::success("Comment posted"));
                Resolution::Committed
            }
            Err(res) => res,
        }
    }

    /// Create a report from a validated draft, under the same rolling
    /// rate limit as comments. Returns the created item so the caller
    /// can patch it into its feed.
    pub async fn create_report(
        &self,
        user: Option<&str>,
        draft: &ReportDraft,
        now_unix_ms: u64,
    ) -> (Resolution, Option<ReportItem>) {
        let Some(user_id) = user else {
            self.push_notice(Notice::error("Please login to submit a report"));
            return (Resolution::AuthRequired, None);
        };
        if !self.begin(NEW_REPORT_KEY, ActionKind::Report, user_id) {
            return (Resolution::Ignored, None);
        }

        let resolution = self
            .rate_limited_insert(user_id, ActionKind::Report, now_unix_ms, |backend| {
                let draft = draft.clone();
                let user_id = user_id.to_string();
                async move { backend.create_report(&user_id, &draft).await }
            })
            .await;
        self.finish(NEW_REPORT_KEY, ActionKind::Report, user_id);

        match resolution {
            Ok(report) => {
                self.push_notice(Notice::success("Report submitted successfully!"));
                (Resolution::Committed, Some(report))
            }
            Err(res) => (res, None),
        }
    }

    /// Flag a report for moderator review. Flagging twice is benign.
    pub async fn flag(&self, report_id: &str, user: Option<&str>, reason: &str) -> Resolution {
        let Some(user_id) = user else {
            self.push_notice(Notice::error("Please login to flag reports"));
            return Resolution::AuthRequired;
        };
        if !self.begin(report_id, ActionKind::Flag, user_id) {
            return Resolution::Ignored;
        }

        let result = self.backend.add_flag(report_id, user_id, reason).await;
        self.finish(report_id, ActionKind::Flag, user_id);
        match result {
            Ok(()) => {
                self.push_notice(Notice::success("Report flagged for review"));
                Resolution::Committed
            }
            Err(BackendError::Duplicate) => {
                self.push_notice(Notice::info("You have already flagged this report"));
                Resolution::DuplicateNoOp
            }
            Err(err) => {
                log::warn!("flag on {report_id} failed: {err}");
                self.push_notice(Notice::error("Failed to submit flag"));
                Resolution::RolledBack
            }
        }
    }

    /// Shared rate-limit-then-insert flow for comment and report
    /// creation. `Err` carries the resolution to surface.
    async fn rate_limited_insert<T, F, Fut>(
        &self,
        user_id: &str,
        kind: ActionKind,
        now_unix_ms: u64,
        insert: F,
    ) -> std::result::Result<T, Resolution>
    where
        F: FnOnce(Arc<dyn CommunityBackend>) -> Fut,
        Fut: std::future::Future<Output = aduan_backend::Result<T>>,
    {
        let window_start = now_unix_ms.saturating_sub(self.tuning.rate_window_ms);
        let count = match self
            .backend
            .count_recent_actions(user_id, kind, window_start)
            .await
        {
            Ok(count) => count,
            Err(err) => {
                log::warn!("rate-limit count for {user_id} failed: {err}");
                self.push_notice(failure_notice(kind));
                return Err(Resolution::RolledBack);
            }
        };
        if count >= self.tuning.rate_limit_per_hour {
            self.push_notice(rate_limit_notice(kind, self.tuning.rate_limit_per_hour));
            return Err(Resolution::RateLimited);
        }

        match insert(Arc::clone(&self.backend)).await {
            Ok(value) => Ok(value),
            Err(err) => {
                log::warn!("{} insert by {user_id} failed: {err}", kind.as_str());
                self.push_notice(failure_notice(kind));
                Err(Resolution::RolledBack)
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn rate_limit_notice(kind: ActionKind, limit: usize) -> Notice {
    match kind {
        ActionKind::Comment => Notice::error(format!(
            "Rate limit exceeded ({limit} comments/hour). Please wait."
        )),
        ActionKind::Report => Notice::error(format!(
            "Rate limit exceeded ({limit} reports/hour). Please try again later."
        )),
        other => Notice::error(format!(
            "Rate limit exceeded ({limit} {}s/hour).",
            other.as_str()
        )),
    }
}

fn failure_notice(kind: ActionKind) -> Notice {
    match kind {
        ActionKind::Comment => Notice::error("Failed to post comment"),
        ActionKind::Report => Notice::error("Failed to submit report. Please try again."),
        other => Notice::error(format!("Failed to {}", other.as_str())),
    }
}
