//! Booking status workflow
//!
//! Confirm/cancel transitions with ownership authorization, an explicit
//! optimistic-transaction wrapper, and downstream notification dispatch.
//! Only the resolved venue owner may move a booking out of `pending`.

use std::sync::Arc;

use avnu_common::db::models::{Booking, BookingStatus, NotificationKind};
use avnu_common::events::{AvnuEvent, EventBus};
use avnu_common::{Error, Result};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::db::bookings as db;
use crate::db::bookings::NewBooking;
use crate::notifications::Notifier;

/// Three-state wrapper around an optimistic status update
///
/// The optimistic phase and the rollback are symmetric by construction: the
/// wrapper owns the pre-transition status, and the only ways out of
/// `PendingOptimistic` are `commit` and `roll_back`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionState {
    PendingOptimistic,
    Committed,
    RolledBack,
}

#[derive(Debug)]
pub struct StatusTransaction {
    previous: BookingStatus,
    target: BookingStatus,
    state: TransactionState,
}

impl StatusTransaction {
    pub fn begin(previous: BookingStatus, target: BookingStatus) -> Self {
        Self {
            previous,
            target,
            state: TransactionState::PendingOptimistic,
        }
    }

    /// Status a client should display while the write is in flight
    pub fn optimistic_status(&self) -> BookingStatus {
        match self.state {
            TransactionState::PendingOptimistic | TransactionState::Committed => self.target,
            TransactionState::RolledBack => self.previous,
        }
    }

    pub fn commit(&mut self) {
        debug_assert_eq!(self.state, TransactionState::PendingOptimistic);
        self.state = TransactionState::Committed;
    }

    /// Restore the pre-transition status; returns what to display
    pub fn roll_back(&mut self) -> BookingStatus {
        debug_assert_eq!(self.state, TransactionState::PendingOptimistic);
        self.state = TransactionState::RolledBack;
        self.previous
    }

    pub fn state(&self) -> &TransactionState {
        &self.state
    }
}

/// Booking creation and status transitions
#[derive(Clone)]
pub struct BookingStatusFlow {
    pool: SqlitePool,
    bus: EventBus,
    notifier: Notifier,
    /// One status update in flight at a time, process-wide. A mutex, not a
    /// queue: concurrent callers fail fast with `Busy`.
    busy: Arc<Mutex<()>>,
}

impl BookingStatusFlow {
    pub fn new(pool: SqlitePool, bus: EventBus, notifier: Notifier) -> Self {
        Self {
            pool,
            bus,
            notifier,
            busy: Arc::new(Mutex::new(())),
        }
    }

    /// Create a booking request in `pending` status and notify the venue
    /// owner
    pub async fn create(&self, new: &NewBooking) -> Result<Booking> {
        if new.guests <= 0 {
            return Err(Error::InvalidInput("guest count must be positive".to_string()));
        }

        let booking = db::insert_booking(&self.pool, new).await?;
        info!("booking {} created for venue {}", booking.id, booking.venue_id);

        if let Ok(Some(owner)) = db::fetch_venue_owner(&self.pool, &booking.venue_id).await {
            if !owner.user_id.is_empty() {
                self.notifier
                    .notify(
                        &owner.user_id,
                        "New booking request",
                        &format!(
                            "New booking request for {} on {}",
                            booking.venue_name, booking.booking_date
                        ),
                        NotificationKind::Booking,
                        Some(format!("/bookings/{}", booking.id)),
                        Some(json!({ "bookingId": booking.id })),
                    )
                    .await;
            }
        }

        Ok(booking)
    }

    /// Transition a booking to `new_status`
    ///
    /// Fails fast with `Busy` when another update is in flight, `Connection`
    /// when the database is unreachable, `NotFound` for a missing booking or
    /// venue owner, and `Forbidden` (performing no mutation) when the acting
    /// user does not own the venue. A same-status call is an idempotent
    /// no-op that skips the write entirely.
    pub async fn update_status(
        &self,
        booking_id: &str,
        new_status: BookingStatus,
        acting_user_id: &str,
    ) -> Result<Booking> {
        let _guard = self.busy.try_lock().map_err(|_| {
            Error::Busy("another status update is in progress, please wait".to_string())
        })?;

        // Fail fast when the backend is unreachable
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Connection(format!("database unreachable: {e}")))?;

        let booking = db::fetch_booking(&self.pool, booking_id).await?;
        let owner = db::fetch_venue_owner(&self.pool, &booking.venue_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("owner info for venue {}", booking.venue_id))
            })?;

        if owner.user_id.is_empty() || owner.user_id != acting_user_id {
            return Err(Error::Forbidden(
                "only the venue owner may update this booking".to_string(),
            ));
        }

        if booking.status == new_status {
            return Ok(booking);
        }

        if !booking.status.can_transition_to(new_status) {
            return Err(Error::InvalidInput(format!(
                "cannot move booking from {} to {}",
                booking.status, new_status
            )));
        }

        let mut tx = StatusTransaction::begin(booking.status, new_status);
        let updated = match db::set_booking_status(&self.pool, booking_id, new_status).await {
            Ok(updated) => {
                tx.commit();
                updated
            }
            Err(e) => {
                let restored = tx.roll_back();
                warn!(
                    "status write for booking {} failed, restoring {}: {}",
                    booking_id, restored, e
                );
                return Err(e);
            }
        };

        info!(
            "booking {} moved {} -> {}",
            booking_id, booking.status, new_status
        );
        self.bus.emit(AvnuEvent::BookingStatusChanged {
            booking_id: booking_id.to_string(),
            venue_id: booking.venue_id.clone(),
            old_status: booking.status,
            new_status,
            timestamp: Utc::now(),
        });

        // Downstream dispatch to the customer is best-effort; a failure here
        // is logged inside the notifier and never fails the workflow
        let (title, body) = match new_status {
            BookingStatus::Confirmed => (
                "Booking confirmed",
                format!("Your booking for {} has been confirmed.", booking.venue_name),
            ),
            BookingStatus::Cancelled => (
                "Booking cancelled",
                format!("Your booking for {} has been cancelled.", booking.venue_name),
            ),
            BookingStatus::Pending => (
                "Booking updated",
                format!("Your booking for {} was updated.", booking.venue_name),
            ),
        };
        self.notifier
            .notify(
                &booking.user_id,
                title,
                &body,
                NotificationKind::Booking,
                Some(format!("/bookings/{}", booking.id)),
                Some(json!({ "bookingId": booking.id, "status": new_status })),
            )
            .await;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimistic_then_commit_shows_target() {
        let mut tx = StatusTransaction::begin(BookingStatus::Pending, BookingStatus::Confirmed);
        assert_eq!(tx.optimistic_status(), BookingStatus::Confirmed);
        tx.commit();
        assert_eq!(tx.optimistic_status(), BookingStatus::Confirmed);
        assert_eq!(*tx.state(), TransactionState::Committed);
    }

    #[test]
    fn rollback_is_symmetric_with_optimistic_update() {
        let mut tx = StatusTransaction::begin(BookingStatus::Pending, BookingStatus::Cancelled);
        assert_eq!(tx.optimistic_status(), BookingStatus::Cancelled);
        let restored = tx.roll_back();
        assert_eq!(restored, BookingStatus::Pending);
        assert_eq!(tx.optimistic_status(), BookingStatus::Pending);
        assert_eq!(*tx.state(), TransactionState::RolledBack);
    }
}
