//! Server-Sent Events push channels
//!
//! One logical channel per (table, filter) pair: messages filtered to a
//! participant pair, notifications filtered by recipient, and a broad venue
//! channel that tells listing views to refetch.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use avnu_common::events::AvnuEvent;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MessagesChannelQuery {
    pub user_id: String,
    pub contact_id: String,
}

/// GET /api/events/messages - conversation push channel
///
/// Inbound unread messages are marked read by the messaging core before they
/// are surfaced here.
pub async fn message_events(
    State(state): State<AppState>,
    Query(query): Query<MessagesChannelQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(
        "SSE client connected to messages channel ({}, {})",
        query.user_id, query.contact_id
    );
    let stream = state
        .messaging
        .conversation_events(query.user_id, query.contact_id)
        .filter_map(|event| async move { serialize_event(&event) });
    sse_response(stream)
}

#[derive(Debug, Deserialize)]
pub struct NotificationsChannelQuery {
    pub user_id: String,
}

/// GET /api/events/notifications - per-user notification channel
pub async fn notification_events(
    State(state): State<AppState>,
    Query(query): Query<NotificationsChannelQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("SSE client connected to notifications channel ({})", query.user_id);
    let rx = state.bus.subscribe();
    let user_id = query.user_id;
    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let user_id = user_id.clone();
        async move {
            match result {
                Ok(event) if event.concerns_notifications_of(&user_id) => serialize_event(&event),
                Ok(_) => None,
                Err(e) => {
                    warn!("notification SSE stream error: {:?}", e);
                    None
                }
            }
        }
    });
    sse_response(stream)
}

/// GET /api/events/venues - broad venue-change channel (refetch, no diffing)
pub async fn venue_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("SSE client connected to venues channel");
    let rx = state.bus.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event @ AvnuEvent::VenueChanged { .. }) => serialize_event(&event),
            Ok(_) => None,
            Err(e) => {
                warn!("venue SSE stream error: {:?}", e);
                None
            }
        }
    });
    sse_response(stream)
}

fn serialize_event(event: &AvnuEvent) -> Option<Result<Event, Infallible>> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Ok(Event::default().event(event.event_type()).data(json))),
        Err(e) => {
            warn!("failed to serialize event: {}", e);
            None
        }
    }
}

fn sse_response<S>(stream: S) -> Sse<S>
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
