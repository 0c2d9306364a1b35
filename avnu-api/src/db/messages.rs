//! Message table access

use avnu_common::db::models::{ConversationContext, Message};
use avnu_common::Result;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};
use uuid::Uuid;

/// New message, before the row exists
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub sender_name: Option<String>,
    pub receiver_name: Option<String>,
    pub context: ConversationContext,
}

/// Fetch the full history between two users, `created_at` ascending
///
/// The pair matches in either ordering; no client-side re-sort.
pub async fn fetch_conversation(pool: &SqlitePool, a: &str, b: &str) -> Result<Vec<Message>> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT * FROM messages
        WHERE (sender_id = ? AND receiver_id = ?)
           OR (sender_id = ? AND receiver_id = ?)
        ORDER BY created_at ASC
        "#,
    )
    .bind(a)
    .bind(b)
    .bind(b)
    .bind(a)
    .fetch_all(pool)
    .await?;
    Ok(messages)
}

/// Mark every unread message addressed to `reader` from `contact` as read
///
/// One batched update; returns the ids that actually flipped.
pub async fn mark_conversation_read(
    pool: &SqlitePool,
    reader: &str,
    contact: &str,
) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>(
        r#"
        UPDATE messages SET read = 1
        WHERE receiver_id = ? AND sender_id = ? AND read = 0
        RETURNING id
        "#,
    )
    .bind(reader)
    .bind(contact)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Mark a single message read; returns false when it was already read
pub async fn mark_message_read(pool: &SqlitePool, message_id: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE messages SET read = 1 WHERE id = ? AND read = 0")
        .bind(message_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Insert a message row; id and created_at are assigned here
pub async fn insert_message<'e, E>(executor: E, new: &NewMessage) -> Result<Message>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let message = Message {
        id: Uuid::new_v4().to_string(),
        sender_id: new.sender_id.clone(),
        receiver_id: new.receiver_id.clone(),
        content: new.content.clone(),
        read: false,
        created_at: Utc::now(),
        sender_name: new.sender_name.clone(),
        receiver_name: new.receiver_name.clone(),
        venue_id: new.context.venue_id.clone(),
        venue_name: new.context.venue_name.clone(),
        booking_id: new.context.booking_id.clone(),
    };

    sqlx::query(
        r#"
        INSERT INTO messages
            (id, sender_id, receiver_id, content, read, created_at,
             sender_name, receiver_name, venue_id, venue_name, booking_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&message.id)
    .bind(&message.sender_id)
    .bind(&message.receiver_id)
    .bind(&message.content)
    .bind(message.read)
    .bind(message.created_at)
    .bind(&message.sender_name)
    .bind(&message.receiver_name)
    .bind(&message.venue_id)
    .bind(&message.venue_name)
    .bind(&message.booking_id)
    .execute(executor)
    .await?;

    Ok(message)
}

/// Whether any message between the pair already carries this venue/booking
/// context (either ordering)
///
/// Used as the auto-seed idempotence guard; runs on the same transaction as
/// the seed insert.
pub async fn context_exists<'e, E>(
    executor: E,
    a: &str,
    b: &str,
    context: &ConversationContext,
) -> Result<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let found = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM messages
            WHERE ((sender_id = ? AND receiver_id = ?)
                OR (sender_id = ? AND receiver_id = ?))
              AND (venue_id = ? OR booking_id = ?)
        )
        "#,
    )
    .bind(a)
    .bind(b)
    .bind(b)
    .bind(a)
    .bind(context.venue_id.as_deref().unwrap_or(""))
    .bind(context.booking_id.as_deref().unwrap_or(""))
    .fetch_one(executor)
    .await?;
    Ok(found != 0)
}
