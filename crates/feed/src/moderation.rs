use crate::error::{FeedError, Result};
use aduan_backend::CommunityBackend;
use aduan_model::{Profile, ReportStatus};
use std::sync::Arc;

/// Admin-only writes. The role gate runs before any backend call; the
/// hosted service enforces the same rule again through row-level
/// access control.
pub struct ModerationConsole {
    backend: Arc<dyn CommunityBackend>,
}

impl ModerationConsole {
    pub fn new(backend: Arc<dyn CommunityBackend>) -> Self {
        Self { backend }
    }

    fn require_admin(caller: Option<&Profile>) -> Result<()> {
        match caller {
            Some(profile) if profile.is_admin() => Ok(()),
            _ => Err(FeedError::AuthRequired),
        }
    }

    pub async fn set_status(
        &self,
        caller: Option<&Profile>,
        report_id: &str,
        status: ReportStatus,
    ) -> Result<()> {
        Self::require_admin(caller)?;
        self.backend.set_status(report_id, status).await?;
        log::info!("status of {report_id} set to {}", status.as_str());
        Ok(())
    }

    pub async fn set_hidden(
        &self,
        caller: Option<&Profile>,
        report_id: &str,
        hidden: bool,
    ) -> Result<()> {
        Self::require_admin(caller)?;
        self.backend.set_hidden(report_id, hidden).await?;
        Ok(())
    }

    pub async fn set_locked(
        &self,
        caller: Option<&Profile>,
        report_id: &str,
        locked: bool,
    ) -> Result<()> {
        Self::require_admin(caller)?;
        self.backend.set_locked(report_id, locked).await?;
        Ok(())
    }

    pub async fn ban_user(
        &self,
        caller: Option<&Profile>,
        user_id: &str,
        banned: bool,
    ) -> Result<()> {
        Self::require_admin(caller)?;
        self.backend.set_banned(user_id, banned).await?;
        log::info!("user {user_id} banned={banned}");
        Ok(())
    }
}
