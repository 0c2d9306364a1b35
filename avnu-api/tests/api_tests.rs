//! Integration tests for the avnu-api HTTP surface
//!
//! Each test drives the full router over an in-memory database: venue
//! filtering, normalization through the detail view, messaging round trips,
//! notification read flags, booking transitions and blocked dates.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot`

use avnu_api::{build_router, AppState};
use avnu_common::events::EventBus;
use avnu_common::retry::RetryPolicy;

async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("connect to in-memory database");
    avnu_common::db::init_schema(&pool).await.expect("create schema");
    pool
}

fn setup_app(pool: SqlitePool) -> axum::Router {
    let bus = EventBus::new(64);
    // zero backoff keeps best-effort retries out of the test clock
    let state = AppState::new(
        pool,
        bus,
        RetryPolicy::new(2, Duration::ZERO),
        "http://127.0.0.1:1/functions",
    );
    build_router(state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON body")
}

async fn seed_venue(
    pool: &SqlitePool,
    id: &str,
    city_id: &str,
    min_capacity: &str,
    max_capacity: &str,
    starting_price: &str,
    category_name: &str,
    amenities: &str,
    owner_user_id: &str,
) {
    let owner_info = json!({
        "name": "Owner",
        "contact": "+91 555",
        "responseTime": "fast",
        "user_id": owner_user_id,
        "socialLinks": {}
    })
    .to_string();

    sqlx::query(
        r#"
        INSERT INTO venues
            (id, name, description, address, city_id, city_name, category_id, category_name,
             min_capacity, max_capacity, starting_price, currency, amenities, gallery_images,
             rating, reviews_count, owner_info, type, parking, wifi)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'INR', ?, ?, ?, ?, ?, 'banquet', 1, 1)
        "#,
    )
    .bind(id)
    .bind(format!("Venue {id}"))
    .bind("A lovely venue for events")
    .bind("12 MG Road")
    .bind(city_id)
    .bind("Pune")
    .bind("wedding")
    .bind(category_name)
    .bind(min_capacity)
    .bind(max_capacity)
    .bind(starting_price)
    .bind(amenities)
    .bind(r#"["https://img.example/one.jpg", "https://img.example/two.jpg"]"#)
    .bind(4.0)
    .bind(9)
    .bind(owner_info)
    .execute(pool)
    .await
    .expect("seed venue");
}

async fn seed_profile(pool: &SqlitePool, id: &str, first: &str, last: &str, role: &str) {
    sqlx::query(
        "INSERT INTO user_profiles (id, first_name, last_name, email, user_role) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(first)
    .bind(last)
    .bind(format!("{id}@example.com"))
    .bind(role)
    .execute(pool)
    .await
    .expect("seed profile");
}

async fn seed_booking(pool: &SqlitePool, id: &str, venue_id: &str, user_id: &str, date: &str, status: &str) {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO bookings
            (id, user_id, venue_id, venue_name, booking_date, start_time, end_time,
             guests, status, total_price, created_at, updated_at)
        VALUES (?, ?, ?, 'Venue', ?, '18:00', '23:00', 100, ?, 25000, ?, ?)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(venue_id)
    .bind(date)
    .bind(status)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("seed booking");
}

// =========================================================================
// Health
// =========================================================================

#[tokio::test]
async fn health_endpoint_reports_module() {
    let app = setup_app(setup_pool().await);
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "avnu-api");
    assert!(body["version"].is_string());
}

// =========================================================================
// Venue filtering
// =========================================================================

#[tokio::test]
async fn guest_count_filter_respects_capacity_range() {
    let pool = setup_pool().await;
    seed_venue(&pool, "v1", "pune", "50", "200", "20000", "Wedding Venues", "WiFi, Parking", "owner-1").await;
    let app = setup_app(pool);

    let response = app.clone().oneshot(get("/api/venues?guests=100")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total_count"], 1);

    for guests in ["20", "250"] {
        let response = app
            .clone()
            .oneshot(get(&format!("/api/venues?guests={guests}")))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["total_count"], 0, "guests={guests} should be excluded");
    }
}

#[tokio::test]
async fn budget_price_band_boundary() {
    let pool = setup_pool().await;
    seed_venue(&pool, "cheap", "pune", "10", "100", "14999", "Party Halls", "WiFi", "owner-1").await;
    seed_venue(&pool, "mid", "pune", "10", "100", "15000", "Party Halls", "WiFi", "owner-1").await;
    let app = setup_app(pool);

    let response = app.oneshot(get("/api/venues?price_range=budget")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["venues"][0]["id"], "cheap");
}

#[tokio::test]
async fn category_filter_matches_messy_stored_shapes() {
    let pool = setup_pool().await;
    // one venue stores categories as a quoted JSON array, the other as a
    // camel-case concatenation
    seed_venue(&pool, "v1", "pune", "10", "100", "20000", "['Wedding Venues', 'Party Halls']", "WiFi", "o1").await;
    seed_venue(&pool, "v2", "pune", "10", "100", "20000", "ConferenceRoomsMeetingRooms", "WiFi", "o1").await;
    let app = setup_app(pool);

    let response = app
        .clone()
        .oneshot(get("/api/venues?category_id=Party%20Halls"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["venues"][0]["id"], "v1");

    let response = app
        .oneshot(get("/api/venues?category_id=Meeting%20Rooms"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["venues"][0]["id"], "v2");
}

#[tokio::test]
async fn free_text_search_is_case_insensitive() {
    let pool = setup_pool().await;
    seed_venue(&pool, "v1", "pune", "10", "100", "20000", "Wedding Venues", "WiFi, Catering", "o1").await;
    let app = setup_app(pool);

    let response = app.clone().oneshot(get("/api/venues?search=CATERING")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total_count"], 1);

    let response = app.oneshot(get("/api/venues?search=nonexistent")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total_count"], 0);
}

#[tokio::test]
async fn venue_detail_is_fully_normalized() {
    let pool = setup_pool().await;
    seed_venue(&pool, "v1", "pune", "50", "200", "20000", "WeddingVenuesBanquetHalls", "WiFi, Parking", "owner-9").await;
    let app = setup_app(pool);

    let response = app.oneshot(get("/api/venues/v1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["capacity"]["min"], 50);
    assert_eq!(body["capacity"]["max"], 200);
    assert_eq!(body["category"], json!(["Wedding Venues", "Banquet Halls"]));
    assert_eq!(body["amenities"], json!(["WiFi", "Parking"]));
    assert_eq!(body["image_url"], "https://img.example/one.jpg");
    assert_eq!(body["owner_info"]["user_id"], "owner-9");
}

#[tokio::test]
async fn unknown_venue_is_404() {
    let app = setup_app(setup_pool().await);
    let response = app.oneshot(get("/api/venues/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =========================================================================
// Rating
// =========================================================================

#[tokio::test]
async fn rating_submission_applies_weighted_average() {
    let pool = setup_pool().await;
    // rating 4.0 across 9 reviews, a new 5 lands on 4.1 across 10
    seed_venue(&pool, "v1", "pune", "10", "100", "20000", "Wedding Venues", "WiFi", "o1").await;
    let app = setup_app(pool);

    let response = app
        .clone()
        .oneshot(post_json("/api/venues/v1/rating", json!({ "rating": 5 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["rating"], 4.1);
    assert_eq!(body["reviewsCount"], 10);
}

#[tokio::test]
async fn out_of_range_rating_is_rejected() {
    let pool = setup_pool().await;
    seed_venue(&pool, "v1", "pune", "10", "100", "20000", "Wedding Venues", "WiFi", "o1").await;
    let app = setup_app(pool);

    let response = app
        .oneshot(post_json("/api/venues/v1/rating", json!({ "rating": 6 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =========================================================================
// Messaging
// =========================================================================

#[tokio::test]
async fn message_round_trip_appears_exactly_once() {
    let pool = setup_pool().await;
    seed_profile(&pool, "owner-1", "Asha", "Mehta", "venue-owner").await;
    seed_profile(&pool, "cust-1", "Ravi", "Kumar", "customer").await;
    let app = setup_app(pool);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/messages",
            json!({
                "sender_id": "cust-1",
                "receiver_id": "owner-1",
                "content": "Is the hall free on the 14th?",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/api/conversations/cust-1?user_id=owner-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "Is the hall free on the 14th?");
    // loading the conversation marked the inbound message read
    assert_eq!(messages[0]["read"], true);
    assert_eq!(body["contact"]["name"], "Ravi Kumar");
    assert_eq!(body["contact"]["role"], "customer");
}

#[tokio::test]
async fn empty_message_is_rejected_locally() {
    let pool = setup_pool().await;
    seed_profile(&pool, "a", "A", "A", "customer").await;
    seed_profile(&pool, "b", "B", "B", "venue-owner").await;
    let app = setup_app(pool);

    let response = app
        .oneshot(post_json(
            "/api/messages",
            json!({ "sender_id": "a", "receiver_id": "b", "content": "   " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn conversation_with_unknown_contact_is_404() {
    let pool = setup_pool().await;
    seed_profile(&pool, "a", "A", "A", "customer").await;
    let app = setup_app(pool);

    let response = app
        .oneshot(get("/api/conversations/ghost?user_id=a"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn send_message_notifies_the_recipient() {
    let pool = setup_pool().await;
    seed_profile(&pool, "owner-1", "Asha", "Mehta", "venue-owner").await;
    seed_profile(&pool, "cust-1", "Ravi", "Kumar", "customer").await;
    let app = setup_app(pool);

    app.clone()
        .oneshot(post_json(
            "/api/messages",
            json!({ "sender_id": "cust-1", "receiver_id": "owner-1", "content": "hello" }),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(get("/api/notifications?user_id=owner-1"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["kind"], "message");
    assert_eq!(list[0]["user_id"], "owner-1");
}

// =========================================================================
// Notifications
// =========================================================================

#[tokio::test]
async fn mark_read_is_idempotent() {
    let pool = setup_pool().await;
    sqlx::query(
        "INSERT INTO notifications (id, user_id, title, message, type, read, created_at) VALUES ('n1', 'u1', 't', 'm', 'system', 0, ?)",
    )
    .bind(Utc::now())
    .execute(&pool)
    .await
    .unwrap();
    let app = setup_app(pool);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json("/api/notifications/n1/read", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["read"], true);
    }

    let response = app
        .oneshot(get("/api/notifications/unread-count?user_id=u1"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["unread"], 0);
}

#[tokio::test]
async fn read_all_flips_every_unread_row() {
    let pool = setup_pool().await;
    for id in ["n1", "n2", "n3"] {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, title, message, type, read, created_at) VALUES (?, 'u1', 't', 'm', 'booking', 0, ?)",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&pool)
        .await
        .unwrap();
    }
    let app = setup_app(pool);

    let response = app
        .clone()
        .oneshot(post_json("/api/notifications/read-all", json!({ "user_id": "u1" })))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["updated"], 3);

    // a second pass finds nothing left to flip
    let response = app
        .clone()
        .oneshot(post_json("/api/notifications/read-all", json!({ "user_id": "u1" })))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["updated"], 0);
}

// =========================================================================
// Booking status workflow
// =========================================================================

#[tokio::test]
async fn non_owner_cannot_update_status() {
    let pool = setup_pool().await;
    seed_venue(&pool, "v1", "pune", "10", "300", "20000", "Wedding Venues", "WiFi", "owner-1").await;
    seed_booking(&pool, "b1", "v1", "cust-1", "2025-06-01", "pending").await;
    let app = setup_app(pool.clone());

    let response = app
        .oneshot(post_json(
            "/api/bookings/b1/status",
            json!({ "status": "confirmed", "user_id": "intruder" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // no mutation happened
    let status: String = sqlx::query_scalar("SELECT status FROM bookings WHERE id = 'b1'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "pending");
}

#[tokio::test]
async fn owner_confirms_and_customer_is_notified() {
    let pool = setup_pool().await;
    seed_venue(&pool, "v1", "pune", "10", "300", "20000", "Wedding Venues", "WiFi", "owner-1").await;
    seed_booking(&pool, "b1", "v1", "cust-1", "2025-06-01", "pending").await;
    let app = setup_app(pool);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/bookings/b1/status",
            json!({ "status": "confirmed", "user_id": "owner-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "confirmed");

    let response = app
        .oneshot(get("/api/notifications?user_id=cust-1"))
        .await
        .unwrap();
    let list = body_json(response).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["kind"], "booking");
}

#[tokio::test]
async fn unknown_status_string_is_rejected() {
    let pool = setup_pool().await;
    let app = setup_app(pool);
    let response = app
        .oneshot(post_json(
            "/api/bookings/b1/status",
            json!({ "status": "approved", "user_id": "owner-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn confirmation_document_for_booking() {
    let pool = setup_pool().await;
    seed_venue(&pool, "v1", "pune", "10", "300", "20000", "Wedding Venues", "WiFi", "owner-1").await;
    seed_booking(&pool, "b1", "v1", "cust-1", "2025-06-01", "confirmed").await;
    let app = setup_app(pool);

    let response = app
        .oneshot(get("/api/bookings/b1/confirmation"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["filename"], "Avnu_Booking_Venue_2025-06-01.pdf");
    assert_eq!(body["status_badge"], "CONFIRMED");
    let qr: Value = serde_json::from_str(body["qr_payload"].as_str().unwrap()).unwrap();
    assert_eq!(qr["bookingId"], "b1");
}

// =========================================================================
// Blocked dates
// =========================================================================

#[tokio::test]
async fn blocking_refused_when_active_booking_exists() {
    let pool = setup_pool().await;
    seed_venue(&pool, "v1", "pune", "10", "300", "20000", "Wedding Venues", "WiFi", "owner-1").await;
    seed_booking(&pool, "b1", "v1", "cust-1", "2025-06-01", "confirmed").await;
    let app = setup_app(pool);

    let response = app
        .oneshot(post_json(
            "/api/blocked-dates",
            json!({
                "venue_id": "v1",
                "date": "2025-06-01",
                "is_full_day": true,
                "created_by": "owner-1",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blocking_a_free_date_succeeds_and_lists() {
    let pool = setup_pool().await;
    seed_venue(&pool, "v1", "pune", "10", "300", "20000", "Wedding Venues", "WiFi", "owner-1").await;
    let app = setup_app(pool);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/blocked-dates",
            json!({
                "venue_id": "v1",
                "date": "2025-07-10",
                "is_full_day": true,
                "reason": "maintenance",
                "created_by": "owner-1",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/api/venues/v1/blocked-dates"))
        .await
        .unwrap();
    let list = body_json(response).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["date"], "2025-07-10");
    assert_eq!(list[0]["is_full_day"], true);
}
