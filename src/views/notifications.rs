use tracing::debug;

use crate::api::{ApiClient, ApiError};
use crate::models::{Notification, NotificationFeed};

/// Local cache of the notification feed, partitioned into two disjoint
/// ordered sequences. Together they always equal the server-reported set:
/// no duplicates, no omissions. An item moves from unread to read only
/// after the server confirms the transition.
#[derive(Debug)]
pub struct NotificationsView {
    api: ApiClient,
    unread: Vec<Notification>,
    read: Vec<Notification>,
}

impl NotificationsView {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            unread: Vec::new(),
            read: Vec::new(),
        }
    }

    pub fn unread(&self) -> &[Notification] {
        &self.unread
    }

    pub fn read(&self) -> &[Notification] {
        &self.read
    }

    pub fn unread_count(&self) -> usize {
        self.unread.len()
    }

    /// Replace both sequences wholesale from the server.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        let feed: NotificationFeed = self.api.get_json("/notifications", true).await?;
        self.apply_feed(feed);
        Ok(())
    }

    /// Mark one notification read. A no-op returning `Ok(false)` if the id
    /// is not currently unread (double-click or stale UI safe). Otherwise
    /// the item moves to the head of the read sequence only once the server
    /// confirms; on failure it stays unread and the error is surfaced, not
    /// retried.
    pub async fn mark_read(&mut self, notification_id: i64) -> Result<bool, ApiError> {
        if !self.unread.iter().any(|n| n.id == notification_id) {
            debug!(notification_id, "mark_read for non-unread id, ignoring");
            return Ok(false);
        }
        self.api
            .post_empty::<()>(
                &format!("/notifications/{}/mark_read", notification_id),
                None,
                true,
            )
            .await?;
        Ok(self.apply_mark_read(notification_id))
    }

    fn apply_feed(&mut self, feed: NotificationFeed) {
        self.unread = feed.unread;
        self.read = feed.read;
    }

    /// Move a confirmed item between the sequences. Most-recent-first
    /// ordering of the read list is preserved by insertion position, not by
    /// re-sorting.
    fn apply_mark_read(&mut self, notification_id: i64) -> bool {
        match self.unread.iter().position(|n| n.id == notification_id) {
            Some(index) => {
                let notification = self.unread.remove(index);
                self.read.insert(0, notification);
                true
            }
            None => false,
        }
    }
}
