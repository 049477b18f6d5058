use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Confirmations displayed as the closing target for a report.
///
/// External policy: the backend decides when a report actually closes.
/// This value is only ever rendered (e.g. "2/3 confirmed").
pub const CONFIRMATIONS_TO_CLOSE: u64 = 3;

/// Minimum title length accepted for a new report.
pub const MIN_TITLE_CHARS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Open,
    Acknowledged,
    InProgress,
    Closed,
}

impl ReportStatus {
    /// Progress order used by the status stepper.
    pub const STEPS: [Self; 4] = [
        Self::Open,
        Self::Acknowledged,
        Self::InProgress,
        Self::Closed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Acknowledged => "acknowledged",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::STEPS.into_iter().find(|s| s.as_str() == raw)
    }

    /// Index into [`Self::STEPS`], for rendering progress.
    pub fn step_index(self) -> usize {
        Self::STEPS.iter().position(|s| *s == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportCategory {
    Roads,
    Lighting,
    Waste,
    Safety,
    Other,
}

impl ReportCategory {
    pub const ALL: [Self; 5] = [
        Self::Roads,
        Self::Lighting,
        Self::Waste,
        Self::Safety,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Roads => "Roads",
            Self::Lighting => "Lighting",
            Self::Waste => "Waste",
            Self::Safety => "Safety",
            Self::Other => "Other",
        }
    }

    /// Case-insensitive, so CLI and query-string input both parse.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw))
    }
}

/// Where a report was filed. Coordinates are optional: manual entry
/// only carries an address string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Location {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

/// Denormalized engagement counters carried with each feed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngagementCounts {
    pub likes: u64,
    pub comments: u64,
    pub confirmations: u64,
}

/// A community-submitted issue report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportItem {
    /// Opaque identifier, unique within any in-memory collection.
    pub id: String,

    pub title: String,
    pub description: Option<String>,
    pub category: ReportCategory,
    pub status: ReportStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    pub created_at_unix_ms: u64,
    pub creator_id: Option<String>,

    #[serde(default)]
    pub counts: EngagementCounts,

    /// Moderation flags. Hidden reports never appear in feeds; locked
    /// reports reject new comments.
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub is_locked: bool,
}

/// A community update ("comment") on a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub report_id: String,
    pub author_id: String,
    pub author_name: Option<String>,
    pub content: String,
    pub created_at_unix_ms: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("title must be at least {MIN_TITLE_CHARS} characters")]
    TitleTooShort,
}

/// Validated input for creating a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: ReportCategory,
    pub location: Option<Location>,
    pub photo_url: Option<String>,
}

impl ReportDraft {
    pub fn new(title: impl Into<String>, category: ReportCategory) -> Result<Self, DraftError> {
        let title = title.into();
        if title.trim().chars().count() < MIN_TITLE_CHARS {
            return Err(DraftError::TitleTooShort);
        }
        Ok(Self {
            title,
            description: None,
            category,
            location: None,
            photo_url: None,
        })
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }
}
