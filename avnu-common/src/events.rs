//! Event types and EventBus for the Avnu push channels
//!
//! The hosted-database change feeds of the original deployment are rendered
//! here as a broadcast bus: every row mutation of interest emits one event,
//! and the SSE endpoints fan filtered subsets out to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::db::models::{BookingStatus, Message, Notification};

/// Row-level change events
///
/// Events are broadcast via [`EventBus`] and serialized as-is for SSE
/// transmission (`type` tag plus payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AvnuEvent {
    /// A message row was inserted
    MessageInserted {
        message: Message,
        timestamp: DateTime<Utc>,
    },

    /// A message row had its read flag set
    MessageRead {
        message_id: String,
        sender_id: String,
        receiver_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A notification row was inserted
    NotificationInserted {
        notification: Notification,
        timestamp: DateTime<Utc>,
    },

    /// A notification row was updated (read-flag changes)
    NotificationUpdated {
        notification: Notification,
        timestamp: DateTime<Utc>,
    },

    /// A booking moved to a new status
    BookingStatusChanged {
        booking_id: String,
        venue_id: String,
        old_status: BookingStatus,
        new_status: BookingStatus,
        timestamp: DateTime<Utc>,
    },

    /// Something about a venue row changed; consumers refetch, no diffing
    VenueChanged {
        venue_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl AvnuEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            AvnuEvent::MessageInserted { .. } => "MessageInserted",
            AvnuEvent::MessageRead { .. } => "MessageRead",
            AvnuEvent::NotificationInserted { .. } => "NotificationInserted",
            AvnuEvent::NotificationUpdated { .. } => "NotificationUpdated",
            AvnuEvent::BookingStatusChanged { .. } => "BookingStatusChanged",
            AvnuEvent::VenueChanged { .. } => "VenueChanged",
        }
    }

    /// Whether this event belongs to the conversation between `a` and `b`
    ///
    /// A conversation is the message set where `{sender, receiver}` equals
    /// either ordering of the pair.
    pub fn concerns_pair(&self, a: &str, b: &str) -> bool {
        let (s, r) = match self {
            AvnuEvent::MessageInserted { message, .. } => {
                (message.sender_id.as_str(), message.receiver_id.as_str())
            }
            AvnuEvent::MessageRead {
                sender_id,
                receiver_id,
                ..
            } => (sender_id.as_str(), receiver_id.as_str()),
            _ => return false,
        };
        (s == a && r == b) || (s == b && r == a)
    }

    /// Whether this event is addressed to `user_id`'s notification feed
    pub fn concerns_notifications_of(&self, user_id: &str) -> bool {
        match self {
            AvnuEvent::NotificationInserted { notification, .. }
            | AvnuEvent::NotificationUpdated { notification, .. } => {
                notification.user_id == user_id
            }
            _ => false,
        }
    }
}

/// Central event distribution bus
///
/// Backed by `tokio::broadcast`: non-blocking publish, any number of
/// concurrent subscribers, automatic cleanup when receivers drop, lag
/// detection for slow subscribers.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AvnuEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<AvnuEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns the number of subscribers that received it; zero when nobody
    /// is listening, which is not an error for fire-and-forget emitters.
    pub fn emit(&self, event: AvnuEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
