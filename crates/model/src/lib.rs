mod action;
mod filter;
mod notification;
mod profile;
mod report;

pub use action::ActionKind;
pub use filter::FeedFilter;
pub use notification::{Notification, NotificationKind};
pub use profile::{Profile, Role};
pub use report::{
    Comment, DraftError, EngagementCounts, Location, ReportCategory, ReportDraft, ReportItem,
    ReportStatus, CONFIRMATIONS_TO_CLOSE, MIN_TITLE_CHARS,
};
