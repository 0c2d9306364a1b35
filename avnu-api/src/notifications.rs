//! Notification center
//!
//! Cross-user notification fan-out: persisted rows, bus events for the SSE
//! channel, and a best-effort `notify` helper used by the booking and
//! messaging flows. Delivery is never allowed to block or fail a primary
//! flow.

use avnu_common::db::models::{Notification, NotificationKind};
use avnu_common::events::{AvnuEvent, EventBus};
use avnu_common::feed::{Feed, InsertOrder};
use avnu_common::retry::{Delivery, RetryPolicy};
use avnu_common::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::warn;

use crate::db::notifications as db;
use crate::db::notifications::NewNotification;

/// Handle for creating and reading notifications
#[derive(Clone)]
pub struct Notifier {
    pool: SqlitePool,
    bus: EventBus,
    policy: RetryPolicy,
}

impl Notifier {
    pub fn new(pool: SqlitePool, bus: EventBus, policy: RetryPolicy) -> Self {
        Self { pool, bus, policy }
    }

    /// Fire-and-forget notification with bounded retry
    ///
    /// Returns `None` after exhausting the retry policy; callers must treat
    /// that as "delivery not guaranteed" and carry on.
    pub async fn notify(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        kind: NotificationKind,
        link: Option<String>,
        data: Option<serde_json::Value>,
    ) -> Option<Notification> {
        let new = NewNotification {
            user_id: user_id.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            kind,
            link,
            data,
        };

        let delivery = self
            .policy
            .run("notification insert", |_| {
                db::insert_notification(&self.pool, &new)
            })
            .await;

        match delivery {
            Delivery::Delivered(notification) => {
                self.bus.emit(AvnuEvent::NotificationInserted {
                    notification: notification.clone(),
                    timestamp: Utc::now(),
                });
                Some(notification)
            }
            Delivery::Exhausted => {
                warn!(
                    "notification to {} ({}) dropped after {} attempts",
                    user_id, title, self.policy.max_attempts
                );
                None
            }
        }
    }

    /// Newest-first notifications for one user
    pub async fn list(&self, user_id: &str, limit: i64) -> Result<Vec<Notification>> {
        db::list_notifications(&self.pool, user_id, limit).await
    }

    /// Idempotent read-flag update; re-marking an already-read row succeeds
    pub async fn mark_read(&self, id: &str) -> Result<Notification> {
        let notification = db::mark_read(&self.pool, id).await?;
        self.bus.emit(AvnuEvent::NotificationUpdated {
            notification: notification.clone(),
            timestamp: Utc::now(),
        });
        Ok(notification)
    }

    /// Mark everything unread for one user; emits one update per flipped row
    pub async fn mark_all_read(&self, user_id: &str) -> Result<u64> {
        let flipped = db::mark_all_read(&self.pool, user_id).await?;
        let count = flipped.len() as u64;
        for notification in flipped {
            self.bus.emit(AvnuEvent::NotificationUpdated {
                notification,
                timestamp: Utc::now(),
            });
        }
        Ok(count)
    }

    /// Authoritative unread count from the database, not from any in-memory
    /// list
    pub async fn unread_count(&self, user_id: &str) -> Result<i64> {
        db::unread_count(&self.pool, user_id).await
    }
}

/// In-memory notification list for one user
///
/// Fed by both the initial fetch and push events; all mutations go through
/// the id-keyed feed so a racing fetch/push duplicate is absorbed. The
/// unread counter is recomputed from the keyed feed after every mutation,
/// never adjusted incrementally.
#[derive(Debug, Clone)]
pub struct NotificationFeed {
    user_id: String,
    feed: Feed<Notification>,
}

impl NotificationFeed {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            feed: Feed::new(InsertOrder::Front),
        }
    }

    /// Seed from a fetch result
    pub fn load(&mut self, notifications: Vec<Notification>) {
        self.feed.extend(notifications);
    }

    /// Apply one push event; events for other users are ignored
    pub fn apply_event(&mut self, event: &AvnuEvent) {
        if !event.concerns_notifications_of(&self.user_id) {
            return;
        }
        match event {
            AvnuEvent::NotificationInserted { notification, .. }
            | AvnuEvent::NotificationUpdated { notification, .. } => {
                self.feed.upsert(notification.clone());
            }
            _ => {}
        }
    }

    pub fn unread_count(&self) -> usize {
        self.feed.iter().filter(|n| !n.read).count()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.feed.to_vec()
    }

    pub fn len(&self) -> usize {
        self.feed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(id: &str, user: &str, read: bool) -> Notification {
        Notification {
            id: id.into(),
            user_id: user.into(),
            title: "t".into(),
            message: "m".into(),
            kind: NotificationKind::System,
            read,
            created_at: Utc::now(),
            link: None,
            data: None,
        }
    }

    #[test]
    fn duplicate_insert_event_does_not_double_count() {
        let mut feed = NotificationFeed::new("u1");
        feed.load(vec![notification("n1", "u1", false)]);

        // the same row races in via the push channel
        let event = AvnuEvent::NotificationInserted {
            notification: notification("n1", "u1", false),
            timestamp: Utc::now(),
        };
        feed.apply_event(&event);

        assert_eq!(feed.len(), 1);
        assert_eq!(feed.unread_count(), 1);
    }

    #[test]
    fn update_event_recomputes_unread_from_feed() {
        let mut feed = NotificationFeed::new("u1");
        feed.load(vec![
            notification("n1", "u1", false),
            notification("n2", "u1", false),
        ]);
        assert_eq!(feed.unread_count(), 2);

        feed.apply_event(&AvnuEvent::NotificationUpdated {
            notification: notification("n1", "u1", true),
            timestamp: Utc::now(),
        });
        assert_eq!(feed.unread_count(), 1);
        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn events_for_other_users_are_ignored() {
        let mut feed = NotificationFeed::new("u1");
        feed.apply_event(&AvnuEvent::NotificationInserted {
            notification: notification("n9", "someone-else", false),
            timestamp: Utc::now(),
        });
        assert!(feed.is_empty());
    }
}
