//! Booking, blocked-date and confirmation endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use avnu_common::db::models::{BlockedDate, Booking, BookingStatus};
use avnu_common::Error;

use crate::confirmation::BookingConfirmation;
use crate::db::blocked_dates::{self, NewBlockedDate};
use crate::db::bookings::{self, NewBooking};
use crate::AppState;

use super::{ApiError, ApiResult};

/// Body for POST /api/bookings
#[derive(Debug, Deserialize)]
pub struct CreateBookingBody {
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

/// POST /api/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    Json(body): Json<CreateBookingBody>,
) -> ApiResult<Json<Booking>> {
    let booking = state
        .bookings
        .create(&NewBooking {
            user_id: body.user_id,
            venue_id: body.venue_id,
            venue_name: body.venue_name,
            booking_date: body.booking_date,
            start_time: body.start_time,
            end_time: body.end_time,
            guests: body.guests,
            total_price: body.total_price,
            special_requests: body.special_requests,
        })
        .await
        .map_err(ApiError)?;
    Ok(Json(booking))
}

/// Body for POST /api/bookings/:id/status
#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
    pub user_id: String,
}

/// POST /api/bookings/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusBody>,
) -> ApiResult<Json<Booking>> {
    let status = BookingStatus::parse(&body.status).ok_or_else(|| {
        ApiError(Error::InvalidInput(format!(
            "unknown booking status '{}'",
            body.status
        )))
    })?;

    let booking = state
        .bookings
        .update_status(&id, status, &body.user_id)
        .await
        .map_err(ApiError)?;
    Ok(Json(booking))
}

/// GET /api/bookings/:id/confirmation
pub async fn get_confirmation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BookingConfirmation>> {
    let booking = bookings::fetch_booking(&state.db, &id).await.map_err(ApiError)?;
    Ok(Json(BookingConfirmation::build(&booking)))
}

#[derive(Debug, Deserialize)]
pub struct UserBookingsQuery {
    pub user_id: String,
}

/// GET /api/bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<UserBookingsQuery>,
) -> ApiResult<Json<Vec<Booking>>> {
    let list = bookings::list_user_bookings(&state.db, &query.user_id)
        .await
        .map_err(ApiError)?;
    Ok(Json(list))
}

/// Body for POST /api/blocked-dates
#[derive(Debug, Deserialize)]
pub struct BlockDateBody {
    pub venue_id: String,
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub is_full_day: bool,
    pub reason: Option<String>,
    pub created_by: String,
}

/// POST /api/blocked-dates
pub async fn block_date(
    State(state): State<AppState>,
    Json(body): Json<BlockDateBody>,
) -> ApiResult<Json<BlockedDate>> {
    let block = blocked_dates::block_date(
        &state.db,
        &NewBlockedDate {
            venue_id: body.venue_id,
            date: body.date,
            start_time: body.start_time,
            end_time: body.end_time,
            is_full_day: body.is_full_day,
            reason: body.reason,
            created_by: body.created_by,
        },
    )
    .await
    .map_err(ApiError)?;
    Ok(Json(block))
}

/// DELETE /api/blocked-dates/:id
pub async fn unblock_date(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    blocked_dates::unblock(&state.db, &id).await.map_err(ApiError)?;
    Ok(Json(json!({ "deleted": true })))
}

/// GET /api/venues/:id/blocked-dates
pub async fn list_blocked_dates(
    State(state): State<AppState>,
    Path(venue_id): Path<String>,
) -> ApiResult<Json<Vec<BlockedDate>>> {
    let blocks = blocked_dates::list_blocked_dates(&state.db, &venue_id)
        .await
        .map_err(ApiError)?;
    Ok(Json(blocks))
}
