//! Venue listing, detail and rating endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use avnu_common::db::models::Venue;

use crate::db::venues::{self, PriceRange, VenueFilter, VenuePage};
use crate::AppState;

use super::{ApiError, ApiResult};

/// Query parameters for GET /api/venues
///
/// `amenities` arrives as a comma list (`amenities=wifi,parking`).
#[derive(Debug, Default, Deserialize)]
pub struct VenueQuery {
    pub city_id: Option<String>,
    pub category_id: Option<String>,
    pub guests: Option<i64>,
    pub price_range: Option<PriceRange>,
    pub amenities: Option<String>,
    #[serde(rename = "type")]
    pub venue_type: Option<String>,
    pub search: Option<String>,
}

impl From<VenueQuery> for VenueFilter {
    fn from(q: VenueQuery) -> Self {
        VenueFilter {
            city_id: q.city_id,
            category_id: q.category_id,
            guests: q.guests,
            price_range: q.price_range,
            amenities: q
                .amenities
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            venue_type: q.venue_type,
            search: q.search,
        }
    }
}

/// GET /api/venues
pub async fn list_venues(
    State(state): State<AppState>,
    Query(query): Query<VenueQuery>,
) -> ApiResult<Json<VenuePage>> {
    let filter: VenueFilter = query.into();
    let page = venues::fetch_venues(&state.db, &filter)
        .await
        .map_err(ApiError)?;
    Ok(Json(page))
}

/// GET /api/venues/:id
pub async fn get_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Venue>> {
    let venue = venues::fetch_venue(&state.db, &id).await.map_err(ApiError)?;
    Ok(Json(venue))
}

/// Body for POST /api/venues/:id/rating
#[derive(Debug, Deserialize)]
pub struct RatingBody {
    pub rating: f64,
    #[allow(dead_code)]
    pub user_id: Option<String>,
}

/// POST /api/venues/:id/rating
pub async fn submit_rating(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RatingBody>,
) -> ApiResult<Json<Value>> {
    let (rating, reviews_count) = venues::submit_rating(&state.db, &state.bus, &id, body.rating)
        .await
        .map_err(ApiError)?;
    Ok(Json(json!({
        "rating": rating,
        "reviewsCount": reviews_count,
    })))
}
