//! Canonical domain models
//!
//! These are the read models produced at the data-access boundary. Raw rows
//! carry loosely-typed JSON-ish columns; nothing outside
//! [`crate::normalize`] is allowed to interpret those shapes, so everything
//! past that boundary works with the fixed types below.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::feed::Keyed;

/// Venue capacity range (guests)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    pub min: i64,
    pub max: i64,
}

/// Venue pricing block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub currency: String,
    pub starting_price: i64,
    pub price_per_person: Option<i64>,
    pub hourly_rate: Option<i64>,
}

/// Embedded owner identity parsed from the `owner_info` column
///
/// `user_id` is the authorization key for owner-only actions. All fields are
/// filled with empty defaults rather than being optional; only the overall
/// value may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnerInfo {
    pub name: String,
    pub contact: String,
    #[serde(rename = "responseTime")]
    pub response_time: String,
    pub user_id: String,
    #[serde(rename = "socialLinks")]
    pub social_links: BTreeMap<String, String>,
}

/// One rules-and-regulations entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueRule {
    pub category: String,
    pub title: String,
    pub description: String,
}

/// Open/close pair for one weekday
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayHours {
    pub open: String,
    pub close: String,
}

/// Canonical venue read model
///
/// Derived from a wide, loosely-typed row; every array/JSON-ish column has
/// already been normalized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub city_id: String,
    pub category: Vec<String>,
    pub category_id: String,
    pub capacity: Capacity,
    pub pricing: Pricing,
    /// First gallery image, when any
    pub image_url: Option<String>,
    pub gallery_images: Vec<String>,
    pub amenities: Vec<String>,
    pub parking: bool,
    pub wifi: bool,
    pub accessibility_features: Vec<String>,
    pub accepted_payment_methods: Vec<String>,
    pub additional_services: Vec<String>,
    pub owner_info: Option<OwnerInfo>,
    pub rules_and_regulations: Vec<VenueRule>,
    pub opening_hours: Option<BTreeMap<String, DayHours>>,
    pub venue_type: Option<String>,
    pub featured: bool,
    pub popular: bool,
    pub rating: f64,
    pub reviews_count: i64,
}

/// A message between two users
///
/// A conversation between two users is the set of messages where
/// `{sender_id, receiver_id}` equals either ordering of the pair. Messages
/// are only ever inserted and read-flagged, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub sender_name: Option<String>,
    pub receiver_name: Option<String>,
    pub venue_id: Option<String>,
    pub venue_name: Option<String>,
    pub booking_id: Option<String>,
}

impl Keyed for Message {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Venue/booking context attached to a conversation
///
/// Inherited from the first message in the history that carries it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub venue_id: Option<String>,
    pub venue_name: Option<String>,
    pub booking_id: Option<String>,
}

impl ConversationContext {
    pub fn is_empty(&self) -> bool {
        self.venue_id.is_none() && self.booking_id.is_none()
    }
}

/// Counterpart role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    VenueOwner,
    Customer,
}

/// Derived (not persisted) contact card for the counterpart user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatContact {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub role: UserRole,
    pub status: Option<String>,
}

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Booking,
    Message,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Booking => "booking",
            NotificationKind::Message => "message",
            NotificationKind::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "booking" => Some(NotificationKind::Booking),
            "message" => Some(NotificationKind::Message),
            "system" => Some(NotificationKind::System),
            _ => None,
        }
    }
}

/// A per-user notification
///
/// `user_id` always identifies the recipient, never the actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub link: Option<String>,
    pub data: Option<serde_json::Value>,
}

impl Keyed for Notification {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Booking lifecycle status
///
/// Valid transitions: `Pending -> Confirmed`, `Pending -> Cancelled`,
/// `Confirmed -> Cancelled`. Nothing leaves `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether `self -> next` is a legal status transition
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A booking row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub venue_id: String,
    pub venue_name: String,
    pub booking_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub guests: i64,
    pub status: BookingStatus,
    pub total_price: i64,
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner-declared unavailability window for a venue
///
/// A full-day block subsumes any partial-time block on the same
/// `(venue_id, date)`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlockedDate {
    pub id: String,
    pub venue_id: String,
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_full_day: bool,
    pub reason: Option<String>,
    pub created_by: String,
}

/// A user profile row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    pub user_role: UserRole,
    pub favorites: Vec<String>,
}

impl UserProfile {
    /// Display name used for contact cards and message name columns
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}
