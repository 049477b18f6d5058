use crate::error::Result;
use aduan_backend::CommunityBackend;
use aduan_model::Notification;
use std::sync::Arc;

/// A user's notification list with optimistic read-marking.
///
/// Mark-read is fire-and-forget: the local flag flips immediately and a
/// backend failure is only logged, never rolled back. A stale read flag
/// corrects itself on the next refresh.
pub struct NotificationInbox {
    backend: Arc<dyn CommunityBackend>,
    user_id: String,
    items: Vec<Notification>,
}

impl NotificationInbox {
    pub fn new(backend: Arc<dyn CommunityBackend>, user_id: impl Into<String>) -> Self {
        Self {
            backend,
            user_id: user_id.into(),
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.items = self.backend.notifications(&self.user_id).await?;
        Ok(())
    }

    pub async fn mark_read(&mut self, notification_id: &str) {
        let Some(entry) = self.items.iter_mut().find(|n| n.id == notification_id) else {
            return;
        };
        if entry.is_read {
            return;
        }
        entry.is_read = true;
        if let Err(err) = self.backend.mark_notification_read(notification_id).await {
            log::warn!("mark_read({notification_id}) failed: {err}");
        }
    }

    pub async fn mark_all_read(&mut self) {
        for entry in self.items.iter_mut() {
            entry.is_read = true;
        }
        if let Err(err) = self
            .backend
            .mark_all_notifications_read(&self.user_id)
            .await
        {
            log::warn!("mark_all_read for {} failed: {err}", self.user_id);
        }
    }
}
