mod accumulator;
mod config;
mod error;
mod inbox;
mod moderation;
mod notice;
mod reconciler;
mod session;
mod trending;

pub use accumulator::{FeedAccumulator, MergeOutcome};
pub use config::FeedTuning;
pub use error::{FeedError, Result};
pub use inbox::NotificationInbox;
pub use moderation::ModerationConsole;
pub use notice::{Notice, NoticeLevel};
pub use reconciler::{EngagementView, Reconciler, Resolution};
pub use session::FeedSession;
pub use trending::{engagement_score, rank, RankedReport};
