//! Notification table access

use avnu_common::db::models::{Notification, NotificationKind};
use avnu_common::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// New notification, before the row exists
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub link: Option<String>,
    pub data: Option<serde_json::Value>,
}

type NotificationRow = (
    String,                // id
    String,                // user_id
    String,                // title
    String,                // message
    String,                // type
    bool,                  // read
    DateTime<Utc>,         // created_at
    Option<String>,        // link
    Option<String>,        // data
);

fn from_row(row: NotificationRow) -> Notification {
    let (id, user_id, title, message, kind, read, created_at, link, data) = row;
    Notification {
        id,
        user_id,
        title,
        message,
        // unknown stored kinds degrade to System rather than failing the fetch
        kind: NotificationKind::parse(&kind).unwrap_or(NotificationKind::System),
        read,
        created_at,
        link,
        data: data.and_then(|raw| serde_json::from_str(&raw).ok()),
    }
}

const COLUMNS: &str = "id, user_id, title, message, type, read, created_at, link, data";

/// Insert a notification row; id and created_at are assigned here
pub async fn insert_notification(pool: &SqlitePool, new: &NewNotification) -> Result<Notification> {
    let notification = Notification {
        id: Uuid::new_v4().to_string(),
        user_id: new.user_id.clone(),
        title: new.title.clone(),
        message: new.message.clone(),
        kind: new.kind,
        read: false,
        created_at: Utc::now(),
        link: new.link.clone(),
        data: new.data.clone(),
    };

    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, title, message, type, read, created_at, link, data)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&notification.id)
    .bind(&notification.user_id)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(notification.kind.as_str())
    .bind(notification.read)
    .bind(notification.created_at)
    .bind(&notification.link)
    .bind(notification.data.as_ref().map(|d| d.to_string()))
    .execute(pool)
    .await?;

    Ok(notification)
}

/// Newest-first notifications for one user
pub async fn list_notifications(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<Notification>> {
    let rows = sqlx::query_as::<_, NotificationRow>(&format!(
        "SELECT {COLUMNS} FROM notifications WHERE user_id = ? ORDER BY created_at DESC LIMIT ?"
    ))
    .bind(user_id)
    .bind(limit.max(1))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(from_row).collect())
}

/// Fetch one notification by id
pub async fn get_notification(pool: &SqlitePool, id: &str) -> Result<Notification> {
    let row = sqlx::query_as::<_, NotificationRow>(&format!(
        "SELECT {COLUMNS} FROM notifications WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("notification {id}")))?;
    Ok(from_row(row))
}

/// Set the read flag; re-marking an already-read row is a no-op success
pub async fn mark_read(pool: &SqlitePool, id: &str) -> Result<Notification> {
    sqlx::query("UPDATE notifications SET read = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    get_notification(pool, id).await
}

/// Mark every unread notification of one user read; returns the rows that
/// actually flipped
pub async fn mark_all_read(pool: &SqlitePool, user_id: &str) -> Result<Vec<Notification>> {
    let rows = sqlx::query_as::<_, NotificationRow>(&format!(
        "UPDATE notifications SET read = 1 WHERE user_id = ? AND read = 0 RETURNING {COLUMNS}"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(from_row).collect())
}

/// Authoritative unread count, straight from the database
pub async fn unread_count(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND read = 0",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}
