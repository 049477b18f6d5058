use crate::report::{ReportCategory, ReportItem, ReportStatus};
use serde::{Deserialize, Serialize};

/// Active feed predicates. A change in any field starts a new feed
/// session (collection cleared, cursor zeroed).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeedFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReportStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ReportCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
}

impl FeedFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(status: ReportStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.category.is_none() && self.search_text.is_none()
    }

    /// Client-side check used when patching realtime inserts into a
    /// filtered feed, and as the trending post-filter. Search text is a
    /// case-insensitive title substring match.
    pub fn matches(&self, item: &ReportItem) -> bool {
        if item.is_hidden {
            return false;
        }
        if let Some(status) = self.status {
            if item.status != status {
                return false;
            }
        }
        if let Some(category) = self.category {
            if item.category != category {
                return false;
            }
        }
        if let Some(text) = &self.search_text {
            if !text.is_empty()
                && !item.title.to_lowercase().contains(&text.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}
