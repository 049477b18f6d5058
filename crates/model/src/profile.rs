use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Public profile attached to reports, comments and notifications.
///
/// Points and badges are awarded by backend policy; this crate only
/// carries them for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub points: u64,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_banned: bool,
}

impl Profile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            avatar_url: None,
            points: 0,
            badges: Vec::new(),
            role: Role::User,
            is_banned: false,
        }
    }

    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(id)
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
