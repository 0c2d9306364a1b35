//! Data access for the marketplace tables
//!
//! Every function here returns fully-normalized read models; raw column
//! shapes never leak past this layer.

pub mod blocked_dates;
pub mod bookings;
pub mod messages;
pub mod notifications;
pub mod profiles;
pub mod venues;
