//! Messaging core
//!
//! Conversation lookup, history fetch, the send-message transaction
//! (insert + mark-read + notify) and the live subscription that surfaces
//! incoming messages and flips their read state.
//!
//! Per conversation the state machine is `Idle -> Loading -> {Error |
//! Ready}`; once `Ready`, appended messages keep arriving via the push
//! channel until the stream is dropped.

use async_stream::stream;
use avnu_common::db::models::{
    ChatContact, ConversationContext, Message, NotificationKind,
};
use avnu_common::events::{AvnuEvent, EventBus};
use avnu_common::feed::{Feed, InsertOrder};
use avnu_common::{Error, Result};
use chrono::Utc;
use futures::stream::Stream;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::db::messages as db;
use crate::db::messages::NewMessage;
use crate::db::profiles::{contact_from_profile, fetch_profile};
use crate::notifications::Notifier;

/// A loaded conversation, ready for display
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub contact: ChatContact,
    pub messages: Vec<Message>,
    pub context: ConversationContext,
}

/// Messaging operations against one database/bus pair
#[derive(Clone)]
pub struct MessagingCore {
    pool: SqlitePool,
    bus: EventBus,
    notifier: Notifier,
}

impl MessagingCore {
    pub fn new(pool: SqlitePool, bus: EventBus, notifier: Notifier) -> Self {
        Self {
            pool,
            bus,
            notifier,
        }
    }

    /// Load the conversation between `self_id` and `contact_id`
    ///
    /// Fails with `NotFound` when the contact profile does not exist. On
    /// success the venue/booking context is inherited from the first message
    /// carrying it (falling back to `opened_with`, the context the view was
    /// opened from), and every unread inbound message is marked read in one
    /// batched update.
    ///
    /// When the history is empty and a context is present, a single opening
    /// message is auto-seeded. The seed runs its existence check and insert
    /// on one transaction, which narrows (but cannot fully close) the
    /// simultaneous-first-message race.
    pub async fn load_conversation(
        &self,
        self_id: &str,
        contact_id: &str,
        opened_with: Option<ConversationContext>,
    ) -> Result<ConversationView> {
        let contact_profile = fetch_profile(&self.pool, contact_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("contact {contact_id}")))?;
        let contact = contact_from_profile(&contact_profile);

        let history = db::fetch_conversation(&self.pool, self_id, contact_id).await?;

        // Duplicate-absorbing cache keyed by row id; history first, then any
        // seeded message, then push events on the live stream
        let mut feed: Feed<Message> = Feed::new(InsertOrder::Back);
        feed.extend(history);

        let inherited = feed
            .iter()
            .find(|m| m.venue_id.is_some() || m.booking_id.is_some())
            .map(|m| ConversationContext {
                venue_id: m.venue_id.clone(),
                venue_name: m.venue_name.clone(),
                booking_id: m.booking_id.clone(),
            });
        let context = inherited
            .or(opened_with)
            .unwrap_or_default();

        if feed.is_empty() && !context.is_empty() {
            if let Some(seeded) = self.seed_opening_message(self_id, contact_id, &context).await? {
                feed.upsert(seeded);
            }
        }

        let marked = db::mark_conversation_read(&self.pool, self_id, contact_id).await?;
        for message_id in marked {
            self.bus.emit(AvnuEvent::MessageRead {
                message_id,
                sender_id: contact_id.to_string(),
                receiver_id: self_id.to_string(),
                timestamp: Utc::now(),
            });
        }

        let messages = feed
            .to_vec()
            .into_iter()
            .map(|mut m| {
                if m.receiver_id == self_id {
                    m.read = true;
                }
                m
            })
            .collect();

        Ok(ConversationView {
            contact,
            messages,
            context,
        })
    }

    /// Send a message from `self_id` to `contact_id`
    ///
    /// Empty or whitespace-only content is rejected locally, before any
    /// database work. On success the recipient gets a best-effort
    /// notification; a failed notification never rolls back the message.
    pub async fn send_message(
        &self,
        self_id: &str,
        contact_id: &str,
        content: &str,
        context: ConversationContext,
    ) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::InvalidInput("message content is empty".to_string()));
        }

        let sender_name = fetch_profile(&self.pool, self_id)
            .await?
            .map(|p| p.display_name());
        let receiver = fetch_profile(&self.pool, contact_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("contact {contact_id}")))?;

        let message = db::insert_message(
            &self.pool,
            &NewMessage {
                sender_id: self_id.to_string(),
                receiver_id: contact_id.to_string(),
                content: content.to_string(),
                sender_name: sender_name.clone(),
                receiver_name: Some(receiver.display_name()),
                context,
            },
        )
        .await?;

        self.bus.emit(AvnuEvent::MessageInserted {
            message: message.clone(),
            timestamp: Utc::now(),
        });

        let from = sender_name.unwrap_or_else(|| "Someone".to_string());
        self.notifier
            .notify(
                contact_id,
                "New message",
                &format!("{from}: {content}"),
                NotificationKind::Message,
                Some(format!("/messages/{self_id}")),
                None,
            )
            .await;

        Ok(message)
    }

    /// Live subscription for one conversation
    ///
    /// Yields message events filtered to the pair. An inbound unread message
    /// is marked read before it is surfaced, and the read-flag update is
    /// re-broadcast for the counterpart's view. The subscription ends when
    /// the returned stream is dropped; no events are buffered past that.
    pub fn conversation_events(
        &self,
        self_id: String,
        contact_id: String,
    ) -> impl Stream<Item = AvnuEvent> {
        let mut rx = self.bus.subscribe();
        let pool = self.pool.clone();
        let bus = self.bus.clone();

        stream! {
            loop {
                let event = match rx.recv().await {
                    Ok(event) => event,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("conversation stream lagged, {} event(s) skipped", skipped);
                        continue;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                };

                if !event.concerns_pair(&self_id, &contact_id) {
                    continue;
                }

                match event {
                    AvnuEvent::MessageInserted { mut message, timestamp } => {
                        if message.receiver_id == self_id && !message.read {
                            match db::mark_message_read(&pool, &message.id).await {
                                Ok(true) => {
                                    message.read = true;
                                    bus.emit(AvnuEvent::MessageRead {
                                        message_id: message.id.clone(),
                                        sender_id: message.sender_id.clone(),
                                        receiver_id: message.receiver_id.clone(),
                                        timestamp: Utc::now(),
                                    });
                                }
                                Ok(false) => message.read = true,
                                Err(e) => warn!("mark-read on live message failed: {}", e),
                            }
                        }
                        yield AvnuEvent::MessageInserted { message, timestamp };
                    }
                    other => yield other,
                }
            }
            debug!("conversation stream for ({}, {}) closed", self_id, contact_id);
        }
    }

    /// Auto-seed the opening message for a context-carrying conversation
    ///
    /// Idempotent per `(pair, venue_id|booking_id)`: the existence check and
    /// the insert share one transaction.
    async fn seed_opening_message(
        &self,
        self_id: &str,
        contact_id: &str,
        context: &ConversationContext,
    ) -> Result<Option<Message>> {
        let content = match (&context.venue_name, &context.booking_id) {
            (Some(venue), _) => format!("Hi! I'm interested in {venue}."),
            (None, Some(booking)) => format!("Hi! I have a question about booking {booking}."),
            (None, None) => return Ok(None),
        };

        let sender_name = fetch_profile(&self.pool, self_id)
            .await?
            .map(|p| p.display_name());

        let mut tx = self.pool.begin().await?;

        if db::context_exists(&mut *tx, self_id, contact_id, context).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        let message = db::insert_message(
            &mut *tx,
            &NewMessage {
                sender_id: self_id.to_string(),
                receiver_id: contact_id.to_string(),
                content,
                sender_name,
                receiver_name: None,
                context: context.clone(),
            },
        )
        .await?;
        tx.commit().await?;

        debug!(
            "seeded opening message {} for pair ({}, {})",
            message.id, self_id, contact_id
        );
        self.bus.emit(AvnuEvent::MessageInserted {
            message: message.clone(),
            timestamp: Utc::now(),
        });

        Ok(Some(message))
    }
}
