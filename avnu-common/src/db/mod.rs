//! Database initialization and schema

pub mod models;

use std::path::Path;

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::info;

use crate::Result;

/// Initialize the database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent - safe to call multiple times)
///
/// Split out from [`init_database`] so tests can run against an in-memory
/// pool.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_venues_table(pool).await?;
    create_bookings_table(pool).await?;
    create_blocked_dates_table(pool).await?;
    create_messages_table(pool).await?;
    create_notifications_table(pool).await?;
    create_user_profiles_table(pool).await?;
    Ok(())
}

/// Venue listings
///
/// The array/JSON-ish columns are TEXT in whatever shape they arrive
/// (JSON array, JSON-encoded string, comma list, concatenated camel-case);
/// only `avnu_common::normalize` interprets them. Capacity and price columns
/// are TEXT for the same reason: sources store both numbers and
/// numeric strings.
async fn create_venues_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS venues (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            city_id TEXT NOT NULL DEFAULT '',
            city_name TEXT NOT NULL DEFAULT '',
            category_id TEXT NOT NULL DEFAULT '',
            category_name TEXT,
            min_capacity TEXT,
            max_capacity TEXT,
            starting_price TEXT,
            currency TEXT NOT NULL DEFAULT 'INR',
            price_per_person TEXT,
            hourly_rate TEXT,
            amenities TEXT,
            gallery_images TEXT,
            accessibility_features TEXT,
            accepted_payment_methods TEXT,
            additional_services TEXT,
            rating REAL NOT NULL DEFAULT 0,
            reviews_count INTEGER NOT NULL DEFAULT 0,
            featured INTEGER NOT NULL DEFAULT 0,
            popular INTEGER NOT NULL DEFAULT 0,
            owner_info TEXT,
            opening_hours TEXT,
            rules_and_regulations TEXT,
            type TEXT,
            zipcode TEXT,
            latitude REAL,
            longitude REAL,
            parking INTEGER NOT NULL DEFAULT 0,
            wifi INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_bookings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bookings (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            venue_id TEXT NOT NULL,
            venue_name TEXT NOT NULL DEFAULT '',
            booking_date TEXT NOT NULL,
            start_time TEXT NOT NULL DEFAULT '',
            end_time TEXT NOT NULL DEFAULT '',
            guests INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'confirmed', 'cancelled')),
            total_price INTEGER NOT NULL DEFAULT 0,
            special_requests TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_venue_date ON bookings(venue_id, booking_date)")
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_blocked_dates_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blocked_dates (
            id TEXT PRIMARY KEY,
            venue_id TEXT NOT NULL,
            date TEXT NOT NULL,
            start_time TEXT,
            end_time TEXT,
            is_full_day INTEGER NOT NULL DEFAULT 0,
            reason TEXT,
            created_by TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_blocked_dates_venue ON blocked_dates(venue_id, date)")
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_messages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            sender_id TEXT NOT NULL,
            receiver_id TEXT NOT NULL,
            content TEXT NOT NULL,
            read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            sender_name TEXT,
            receiver_name TEXT,
            venue_id TEXT,
            venue_name TEXT,
            booking_id TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_pair ON messages(sender_id, receiver_id, created_at)")
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_notifications_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            type TEXT NOT NULL DEFAULT 'system'
                CHECK (type IN ('booking', 'message', 'system')),
            read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            link TEXT,
            data TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, created_at)")
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_user_profiles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_profiles (
            id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL DEFAULT '',
            phone TEXT,
            profile_image TEXT,
            user_role TEXT NOT NULL DEFAULT 'customer'
                CHECK (user_role IN ('venue-owner', 'customer')),
            favorites TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_creates_database_file_and_tables() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("avnu.db");

        let pool = init_database(&db_path).await.unwrap();
        assert!(db_path.exists());

        // schema creation is idempotent
        init_schema(&pool).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM venues")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
