//! Blocked-date table access
//!
//! Owner-declared unavailability windows, independent of confirmed bookings.
//! Invariants: a full-day block subsumes partial blocks on the same
//! `(venue_id, date)`, and blocking is refused while pending or confirmed
//! bookings exist on that date.

use avnu_common::db::models::BlockedDate;
use avnu_common::{Error, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::bookings::active_bookings_on_date;

/// New block request, before the row exists
#[derive(Debug, Clone)]
pub struct NewBlockedDate {
    pub venue_id: String,
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_full_day: bool,
    pub reason: Option<String>,
    pub created_by: String,
}

/// Block a date (or a partial window of it)
///
/// Refused when pending/confirmed bookings already exist on that date, and
/// when a partial window is requested while a full-day block already covers
/// the date. Inserting a full-day block removes the partial blocks it
/// subsumes.
pub async fn block_date(pool: &SqlitePool, new: &NewBlockedDate) -> Result<BlockedDate> {
    let active = active_bookings_on_date(pool, &new.venue_id, new.date).await?;
    if active > 0 {
        return Err(Error::InvalidInput(format!(
            "cannot block {}: {} active booking(s) exist on that date",
            new.date, active
        )));
    }

    let full_day_exists = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM blocked_dates WHERE venue_id = ? AND date = ? AND is_full_day = 1)",
    )
    .bind(&new.venue_id)
    .bind(new.date)
    .fetch_one(pool)
    .await?;

    if !new.is_full_day && full_day_exists != 0 {
        return Err(Error::InvalidInput(format!(
            "{} is already blocked for the full day",
            new.date
        )));
    }

    if new.is_full_day {
        sqlx::query("DELETE FROM blocked_dates WHERE venue_id = ? AND date = ? AND is_full_day = 0")
            .bind(&new.venue_id)
            .bind(new.date)
            .execute(pool)
            .await?;
    }

    let block = BlockedDate {
        id: Uuid::new_v4().to_string(),
        venue_id: new.venue_id.clone(),
        date: new.date,
        start_time: if new.is_full_day {
            None
        } else {
            new.start_time.clone()
        },
        end_time: if new.is_full_day {
            None
        } else {
            new.end_time.clone()
        },
        is_full_day: new.is_full_day,
        reason: new.reason.clone(),
        created_by: new.created_by.clone(),
    };

    sqlx::query(
        r#"
        INSERT INTO blocked_dates
            (id, venue_id, date, start_time, end_time, is_full_day, reason, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&block.id)
    .bind(&block.venue_id)
    .bind(block.date)
    .bind(&block.start_time)
    .bind(&block.end_time)
    .bind(block.is_full_day)
    .bind(&block.reason)
    .bind(&block.created_by)
    .execute(pool)
    .await?;

    Ok(block)
}

/// Remove one block
pub async fn unblock(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM blocked_dates WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("blocked date {id}")));
    }
    Ok(())
}

/// All blocks for one venue, date ascending
pub async fn list_blocked_dates(pool: &SqlitePool, venue_id: &str) -> Result<Vec<BlockedDate>> {
    let blocks = sqlx::query_as::<_, BlockedDate>(
        "SELECT * FROM blocked_dates WHERE venue_id = ? ORDER BY date ASC",
    )
    .bind(venue_id)
    .fetch_all(pool)
    .await?;
    Ok(blocks)
}

/// Whether any block (full-day or partial) exists on this date
pub async fn is_date_blocked(pool: &SqlitePool, venue_id: &str, date: NaiveDate) -> Result<bool> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM blocked_dates WHERE venue_id = ? AND date = ?)",
    )
    .bind(venue_id)
    .bind(date)
    .fetch_one(pool)
    .await?;
    Ok(found != 0)
}
