//! Booking confirmation document model
//!
//! Builds the fixed-layout content the PDF renderer consumes: header, status
//! badge, two-column detail rows, price block and QR payload. The rendering
//! itself happens elsewhere; this module only guarantees the contract.

use avnu_common::db::models::{Booking, BookingStatus};
use serde::Serialize;
use serde_json::json;

/// One label/value row in the two-column details block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub label: String,
    pub value: String,
}

/// Everything the renderer needs for one confirmation
#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub filename: String,
    pub header: String,
    pub status_badge: String,
    pub details: Vec<DetailRow>,
    pub price_block: String,
    /// JSON string encoded into the QR code
    pub qr_payload: String,
}

impl BookingConfirmation {
    /// Build the confirmation document for one booking
    pub fn build(booking: &Booking) -> Self {
        let date = booking.booking_date.format("%Y-%m-%d").to_string();
        let filename = format!(
            "Avnu_Booking_{}_{}.pdf",
            sanitize_for_filename(&booking.venue_name),
            date
        );

        let qr_payload = json!({
            "bookingId": booking.id,
            "venueId": booking.venue_id,
            "venueName": booking.venue_name,
            "date": date,
            "status": booking.status,
        })
        .to_string();

        let details = vec![
            DetailRow {
                label: "Venue".to_string(),
                value: booking.venue_name.clone(),
            },
            DetailRow {
                label: "Date".to_string(),
                value: date,
            },
            DetailRow {
                label: "Time".to_string(),
                value: format!("{} - {}", booking.start_time, booking.end_time),
            },
            DetailRow {
                label: "Guests".to_string(),
                value: booking.guests.to_string(),
            },
            DetailRow {
                label: "Booking ID".to_string(),
                value: booking.id.clone(),
            },
        ];

        Self {
            filename,
            header: "Booking Confirmation".to_string(),
            status_badge: status_badge(booking.status),
            details,
            price_block: format!("Total: INR {}", booking.total_price),
            qr_payload,
        }
    }
}

fn status_badge(status: BookingStatus) -> String {
    match status {
        BookingStatus::Pending => "PENDING".to_string(),
        BookingStatus::Confirmed => "CONFIRMED".to_string(),
        BookingStatus::Cancelled => "CANCELLED".to_string(),
    }
}

/// Keep filenames portable: alphanumerics survive, everything else collapses
/// to single underscores
fn sanitize_for_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.push(c);
            last_was_sep = false;
        } else if !last_was_sep && !out.is_empty() {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn booking() -> Booking {
        Booking {
            id: "b-42".into(),
            user_id: "customer-1".into(),
            venue_id: "v-1".into(),
            venue_name: "Grand Pearl Banquet".into(),
            booking_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            start_time: "18:00".into(),
            end_time: "23:00".into(),
            guests: 120,
            status: BookingStatus::Confirmed,
            total_price: 45_000,
            special_requests: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn filename_follows_pattern() {
        let doc = BookingConfirmation::build(&booking());
        assert_eq!(doc.filename, "Avnu_Booking_Grand_Pearl_Banquet_2025-03-14.pdf");
    }

    #[test]
    fn qr_payload_carries_identity_fields() {
        let doc = BookingConfirmation::build(&booking());
        let payload: serde_json::Value = serde_json::from_str(&doc.qr_payload).unwrap();
        assert_eq!(payload["bookingId"], "b-42");
        assert_eq!(payload["venueId"], "v-1");
        assert_eq!(payload["venueName"], "Grand Pearl Banquet");
        assert_eq!(payload["date"], "2025-03-14");
        assert_eq!(payload["status"], "confirmed");
    }

    #[test]
    fn sanitization_collapses_awkward_names() {
        assert_eq!(sanitize_for_filename("The  Loft & Hall!"), "The_Loft_Hall");
        assert_eq!(sanitize_for_filename("***"), "");
    }
}
