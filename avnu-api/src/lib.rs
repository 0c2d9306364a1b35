//! avnu-api - venue marketplace core service
//!
//! HTTP service over the marketplace database: venue listing and detail,
//! owner-customer messaging, notifications, booking status workflow,
//! blocked dates, rating submission and the SSE push channels.

use axum::routing::{delete, get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

use avnu_common::events::EventBus;
use avnu_common::retry::RetryPolicy;

pub mod api;
pub mod assistant;
pub mod booking_flow;
pub mod confirmation;
pub mod db;
pub mod messaging;
pub mod notifications;

use assistant::AssistantClient;
use booking_flow::BookingStatusFlow;
use messaging::MessagingCore;
use notifications::Notifier;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub bus: EventBus,
    pub notifier: Notifier,
    pub messaging: MessagingCore,
    pub bookings: BookingStatusFlow,
    pub assistant: AssistantClient,
}

impl AppState {
    /// Wire up the service graph over one pool/bus pair
    pub fn new(
        db: SqlitePool,
        bus: EventBus,
        notify_retry: RetryPolicy,
        functions_base_url: &str,
    ) -> Self {
        let notifier = Notifier::new(db.clone(), bus.clone(), notify_retry);
        let messaging = MessagingCore::new(db.clone(), bus.clone(), notifier.clone());
        let bookings = BookingStatusFlow::new(db.clone(), bus.clone(), notifier.clone());
        let assistant = AssistantClient::new(functions_base_url);
        Self {
            db,
            bus,
            notifier,
            messaging,
            bookings,
            assistant,
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health::health))
        // Venues
        .route("/api/venues", get(api::venues::list_venues))
        .route("/api/venues/:id", get(api::venues::get_venue))
        .route("/api/venues/:id/rating", post(api::venues::submit_rating))
        .route(
            "/api/venues/:id/blocked-dates",
            get(api::bookings::list_blocked_dates),
        )
        // Messaging
        .route(
            "/api/conversations/:contact_id",
            get(api::messages::get_conversation),
        )
        .route("/api/messages", post(api::messages::send_message))
        // Notifications
        .route(
            "/api/notifications",
            get(api::notifications::list_notifications),
        )
        .route(
            "/api/notifications/unread-count",
            get(api::notifications::unread_count),
        )
        .route(
            "/api/notifications/:id/read",
            post(api::notifications::mark_read),
        )
        .route(
            "/api/notifications/read-all",
            post(api::notifications::mark_all_read),
        )
        // Bookings
        .route(
            "/api/bookings",
            get(api::bookings::list_bookings).post(api::bookings::create_booking),
        )
        .route("/api/bookings/:id/status", post(api::bookings::update_status))
        .route(
            "/api/bookings/:id/confirmation",
            get(api::bookings::get_confirmation),
        )
        // Assistant proxy
        .route("/api/assistant", post(api::assistant::ask_assistant))
        // Blocked dates
        .route("/api/blocked-dates", post(api::bookings::block_date))
        .route("/api/blocked-dates/:id", delete(api::bookings::unblock_date))
        // Push channels
        .route("/api/events/messages", get(api::sse::message_events))
        .route(
            "/api/events/notifications",
            get(api::sse::notification_events),
        )
        .route("/api/events/venues", get(api::sse::venue_events))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
