//! Shared library for the Avnu venue marketplace services
//!
//! Holds everything the service crates have in common: the error taxonomy,
//! configuration resolution, canonical domain models, normalization of the
//! loosely-typed venue columns, the event bus backing the push channels, and
//! database initialization.

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod feed;
pub mod normalize;
pub mod retry;

pub use error::{Error, Result};
