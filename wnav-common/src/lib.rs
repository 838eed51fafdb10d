//! # WNAV Common Library
//!
//! Shared code for the WNAV navigation crates including:
//! - Geodesy helpers (haversine distance, bearings, angle normalisation)
//! - Encoded polyline codec
//! - Event types (NavEvent enum) and the broadcast EventBus
//! - Configuration loading
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod polyline;
pub mod time;

pub use error::{Error, Result};
pub use geo::LatLng;
