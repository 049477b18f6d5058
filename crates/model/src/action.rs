use serde::{Deserialize, Serialize};

/// User action kinds, shared by the optimistic reconciler's pending
/// keys and the backend's rolling rate-limit counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Like,
    Confirm,
    Follow,
    Comment,
    Report,
    Flag,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Confirm => "confirm",
            Self::Follow => "follow",
            Self::Comment => "comment",
            Self::Report => "report",
            Self::Flag => "flag",
        }
    }
}
