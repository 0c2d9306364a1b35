//! Venue fetching, filtering and row transformation
//!
//! Venue rows are wide and loosely typed; `venue_from_row` funnels every
//! JSON-ish column through the normalizer so consumers only ever see the
//! canonical [`Venue`] shape.

use avnu_common::db::models::{Capacity, Pricing, Venue};
use avnu_common::events::{AvnuEvent, EventBus};
use avnu_common::normalize::{
    normalize_array_field, normalize_opening_hours, normalize_owner_info, normalize_rules,
    parse_float_field, parse_int_field,
};
use avnu_common::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Price bands over `starting_price`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceRange {
    /// below 15000
    Budget,
    /// 15000 inclusive to 30000 exclusive
    Mid,
    /// 30000 and above
    Luxury,
}

impl PriceRange {
    pub fn contains(&self, starting_price: i64) -> bool {
        match self {
            PriceRange::Budget => starting_price < 15_000,
            PriceRange::Mid => (15_000..30_000).contains(&starting_price),
            PriceRange::Luxury => starting_price >= 30_000,
        }
    }
}

/// Listing/search filter
#[derive(Debug, Clone, Default)]
pub struct VenueFilter {
    pub city_id: Option<String>,
    pub category_id: Option<String>,
    pub guests: Option<i64>,
    pub price_range: Option<PriceRange>,
    pub amenities: Vec<String>,
    pub venue_type: Option<String>,
    pub search: Option<String>,
}

/// One page of filtered venues
#[derive(Debug, Clone, Serialize)]
pub struct VenuePage {
    pub venues: Vec<Venue>,
    pub total_count: i64,
}

/// Fetch venues matching `filter`
///
/// City and type narrow the SQL query; everything that depends on
/// normalized array fields (category containment, amenities, capacity,
/// price band, free-text search) is applied in code after the fetch, since
/// the stored shapes cannot be compared in SQL. All-or-nothing: a database
/// error fails the whole call.
pub async fn fetch_venues(pool: &SqlitePool, filter: &VenueFilter) -> Result<VenuePage> {
    let mut sql = String::from("SELECT * FROM venues WHERE 1 = 1");
    if filter.city_id.is_some() {
        sql.push_str(" AND city_id = ?");
    }
    if filter.venue_type.is_some() {
        sql.push_str(" AND type = ?");
    }
    sql.push_str(" ORDER BY featured DESC, rating DESC");

    let mut query = sqlx::query(&sql);
    if let Some(city_id) = &filter.city_id {
        query = query.bind(city_id);
    }
    if let Some(venue_type) = &filter.venue_type {
        query = query.bind(venue_type);
    }

    let rows = query.fetch_all(pool).await?;
    let venues: Vec<Venue> = rows
        .iter()
        .map(venue_from_row)
        .filter(|venue| matches_filter(venue, filter))
        .collect();

    let total_count = venues.len() as i64;
    Ok(VenuePage {
        venues,
        total_count,
    })
}

/// Fetch a single venue by id
pub async fn fetch_venue(pool: &SqlitePool, id: &str) -> Result<Venue> {
    let row = sqlx::query("SELECT * FROM venues WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("venue {id}")))?;
    Ok(venue_from_row(&row))
}

fn matches_filter(venue: &Venue, filter: &VenueFilter) -> bool {
    if let Some(category_id) = &filter.category_id {
        let wanted = category_id.to_lowercase();
        let contained = venue.category.iter().any(|c| c.to_lowercase() == wanted)
            || venue.category_id.to_lowercase() == wanted;
        if !contained {
            return false;
        }
    }

    if let Some(guests) = filter.guests {
        if guests < venue.capacity.min || guests > venue.capacity.max {
            return false;
        }
    }

    if let Some(range) = &filter.price_range {
        if !range.contains(venue.pricing.starting_price) {
            return false;
        }
    }

    if !filter.amenities.is_empty() {
        let have: Vec<String> = venue.amenities.iter().map(|a| a.to_lowercase()).collect();
        let all_present = filter
            .amenities
            .iter()
            .all(|wanted| have.contains(&wanted.to_lowercase()));
        if !all_present {
            return false;
        }
    }

    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        if !needle.is_empty() && !matches_search(venue, &needle) {
            return false;
        }
    }

    true
}

fn matches_search(venue: &Venue, needle: &str) -> bool {
    venue.name.to_lowercase().contains(needle)
        || venue.description.to_lowercase().contains(needle)
        || venue.city.to_lowercase().contains(needle)
        || venue
            .category
            .iter()
            .any(|c| c.to_lowercase().contains(needle))
        || venue
            .amenities
            .iter()
            .any(|a| a.to_lowercase().contains(needle))
}

/// Build the canonical read model from a raw row
pub fn venue_from_row(row: &SqliteRow) -> Venue {
    let gallery_images = normalize_array_field(&loose_value(row, "gallery_images"));
    let image_url = gallery_images.first().cloned();

    Venue {
        id: text(row, "id"),
        name: text(row, "name"),
        description: text(row, "description"),
        address: text(row, "address"),
        city: text(row, "city_name"),
        city_id: text(row, "city_id"),
        category: normalize_array_field(&loose_value(row, "category_name")),
        category_id: text(row, "category_id"),
        capacity: Capacity {
            min: parse_int_field(&loose_value(row, "min_capacity")),
            max: parse_int_field(&loose_value(row, "max_capacity")),
        },
        pricing: Pricing {
            currency: {
                let c = text(row, "currency");
                if c.is_empty() {
                    "INR".to_string()
                } else {
                    c
                }
            },
            starting_price: parse_int_field(&loose_value(row, "starting_price")),
            price_per_person: positive(parse_int_field(&loose_value(row, "price_per_person"))),
            hourly_rate: positive(parse_int_field(&loose_value(row, "hourly_rate"))),
        },
        image_url,
        gallery_images,
        amenities: normalize_array_field(&loose_value(row, "amenities")),
        parking: int(row, "parking") != 0,
        wifi: int(row, "wifi") != 0,
        accessibility_features: normalize_array_field(&loose_value(row, "accessibility_features")),
        accepted_payment_methods: normalize_array_field(&loose_value(
            row,
            "accepted_payment_methods",
        )),
        additional_services: normalize_array_field(&loose_value(row, "additional_services")),
        owner_info: normalize_owner_info(&loose_value(row, "owner_info")),
        rules_and_regulations: normalize_rules(&loose_value(row, "rules_and_regulations")),
        opening_hours: normalize_opening_hours(&loose_value(row, "opening_hours")),
        venue_type: row.try_get::<Option<String>, _>("type").ok().flatten(),
        featured: int(row, "featured") != 0,
        popular: int(row, "popular") != 0,
        rating: parse_float_field(&loose_value(row, "rating")),
        reviews_count: parse_int_field(&loose_value(row, "reviews_count")),
    }
}

/// Apply one rating to the venue's weighted average
///
/// `new = (old_rating * old_count + rating) / (old_count + 1)`, rounded to
/// one decimal. Emits `VenueChanged` so listing subscribers refetch.
pub async fn submit_rating(
    pool: &SqlitePool,
    bus: &EventBus,
    venue_id: &str,
    rating: f64,
) -> Result<(f64, i64)> {
    if !(1.0..=5.0).contains(&rating) {
        return Err(Error::InvalidInput(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    let venue = fetch_venue(pool, venue_id).await?;
    let old_count = venue.reviews_count;
    let new_count = old_count + 1;
    let new_rating =
        ((venue.rating * old_count as f64 + rating) / new_count as f64 * 10.0).round() / 10.0;

    sqlx::query("UPDATE venues SET rating = ?, reviews_count = ? WHERE id = ?")
        .bind(new_rating)
        .bind(new_count)
        .bind(venue_id)
        .execute(pool)
        .await?;

    bus.emit(AvnuEvent::VenueChanged {
        venue_id: venue_id.to_string(),
        timestamp: Utc::now(),
    });

    Ok((new_rating, new_count))
}

fn positive(v: i64) -> Option<i64> {
    if v > 0 {
        Some(v)
    } else {
        None
    }
}

/// Read a column that may hold TEXT, INTEGER or REAL into a JSON value
fn loose_value(row: &SqliteRow, col: &str) -> Value {
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(col) {
        return Value::String(s);
    }
    if let Ok(Some(i)) = row.try_get::<Option<i64>, _>(col) {
        return serde_json::json!(i);
    }
    if let Ok(Some(f)) = row.try_get::<Option<f64>, _>(col) {
        return serde_json::json!(f);
    }
    Value::Null
}

fn text(row: &SqliteRow, col: &str) -> String {
    row.try_get::<Option<String>, _>(col)
        .ok()
        .flatten()
        .unwrap_or_default()
}

fn int(row: &SqliteRow, col: &str) -> i64 {
    row.try_get::<Option<i64>, _>(col).ok().flatten().unwrap_or(0)
}
