//! User profile lookups

use avnu_common::db::models::{ChatContact, UserProfile, UserRole};
use avnu_common::normalize::normalize_array_field;
use avnu_common::Result;
use serde_json::Value;
use sqlx::SqlitePool;

type ProfileRow = (
    String,         // id
    String,         // first_name
    String,         // last_name
    String,         // email
    Option<String>, // phone
    Option<String>, // profile_image
    String,         // user_role
    Option<String>, // favorites
);

/// Fetch a profile by user id
pub async fn fetch_profile(pool: &SqlitePool, user_id: &str) -> Result<Option<UserProfile>> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT id, first_name, last_name, email, phone, profile_image, user_role, favorites
        FROM user_profiles WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, first_name, last_name, email, phone, profile_image, user_role, favorites)| {
        UserProfile {
            id,
            first_name,
            last_name,
            email,
            phone,
            profile_image,
            user_role: match user_role.as_str() {
                "venue-owner" => UserRole::VenueOwner,
                _ => UserRole::Customer,
            },
            favorites: favorites
                .map(|raw| normalize_array_field(&Value::String(raw)))
                .unwrap_or_default(),
        }
    }))
}

/// Build the derived contact card for a conversation counterpart
pub fn contact_from_profile(profile: &UserProfile) -> ChatContact {
    ChatContact {
        id: profile.id.clone(),
        name: profile.display_name(),
        image: profile.profile_image.clone(),
        role: profile.user_role,
        status: None,
    }
}
