use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Comment,
    StatusChange,
    Ban,
}

/// An inbox entry for a report owner (or, for bans, the banned user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub created_at_unix_ms: u64,
    #[serde(default)]
    pub is_read: bool,

    /// Who triggered it. Absent for system notifications (bans).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<String>,

    /// The report this is about. Absent for bans.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_title: Option<String>,
}
