use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single notification. Read/unread status is not a field on the record;
/// the server reports the feed already partitioned (see `NotificationFeed`)
/// and the view keeps the two sequences disjoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Wire shape of `GET /notifications`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFeed {
    #[serde(default)]
    pub unread: Vec<Notification>,
    #[serde(default)]
    pub read: Vec<Notification>,
}
