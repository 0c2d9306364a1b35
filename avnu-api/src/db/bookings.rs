//! Booking table access

use avnu_common::db::models::{Booking, BookingStatus, OwnerInfo};
use avnu_common::normalize::normalize_owner_info;
use avnu_common::{Error, Result};
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

/// New booking request, before the row exists
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: String,
    pub venue_id: String,
    pub venue_name: String,
    pub booking_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub guests: i64,
    pub total_price: i64,
    pub special_requests: Option<String>,
}

/// Insert a new booking in `pending` status
pub async fn insert_booking(pool: &SqlitePool, new: &NewBooking) -> Result<Booking> {
    let now = Utc::now();
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        user_id: new.user_id.clone(),
        venue_id: new.venue_id.clone(),
        venue_name: new.venue_name.clone(),
        booking_date: new.booking_date,
        start_time: new.start_time.clone(),
        end_time: new.end_time.clone(),
        guests: new.guests,
        status: BookingStatus::Pending,
        total_price: new.total_price,
        special_requests: new.special_requests.clone(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO bookings
            (id, user_id, venue_id, venue_name, booking_date, start_time, end_time,
             guests, status, total_price, special_requests, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&booking.id)
    .bind(&booking.user_id)
    .bind(&booking.venue_id)
    .bind(&booking.venue_name)
    .bind(booking.booking_date)
    .bind(&booking.start_time)
    .bind(&booking.end_time)
    .bind(booking.guests)
    .bind(booking.status)
    .bind(booking.total_price)
    .bind(&booking.special_requests)
    .bind(booking.created_at)
    .bind(booking.updated_at)
    .execute(pool)
    .await?;

    Ok(booking)
}

/// Fetch one booking by id
pub async fn fetch_booking(pool: &SqlitePool, id: &str) -> Result<Booking> {
    sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("booking {id}")))
}

/// Resolve the owner identity of a venue from its `owner_info` column
///
/// `NotFound` when the venue row is missing; `None` when the row exists but
/// carries no parseable owner info.
pub async fn fetch_venue_owner(pool: &SqlitePool, venue_id: &str) -> Result<Option<OwnerInfo>> {
    let raw = sqlx::query_scalar::<_, Option<String>>("SELECT owner_info FROM venues WHERE id = ?")
        .bind(venue_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("venue {venue_id}")))?;

    Ok(raw.and_then(|s| normalize_owner_info(&Value::String(s))))
}

/// Persist a status transition and bump `updated_at`
pub async fn set_booking_status(
    pool: &SqlitePool,
    booking_id: &str,
    status: BookingStatus,
) -> Result<Booking> {
    sqlx::query("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(Utc::now())
        .bind(booking_id)
        .execute(pool)
        .await?;
    fetch_booking(pool, booking_id).await
}

/// Count pending/confirmed bookings on one venue date
pub async fn active_bookings_on_date(
    pool: &SqlitePool,
    venue_id: &str,
    date: NaiveDate,
) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM bookings
        WHERE venue_id = ? AND booking_date = ?
          AND status IN ('pending', 'confirmed')
        "#,
    )
    .bind(venue_id)
    .bind(date)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Bookings made by one user, newest first
pub async fn list_user_bookings(pool: &SqlitePool, user_id: &str) -> Result<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(
        "SELECT * FROM bookings WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(bookings)
}
