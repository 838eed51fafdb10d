//! # WNAV Live Navigation Tracking Engine (wnav-tracker)
//!
//! Consumes a stream of position fixes during an active trip and derives
//! route progress, off-route rerouting, de-duplicated turn, destination and
//! ETA announcements, and speed-adaptive camera zoom.
//!
//! **Architecture:** synchronous per-fix state machines ([`tracking`]) owned
//! by a [`session::NavigationSession`], driven by the tokio-based
//! [`session::NavigationSessionController`].

pub mod config;
pub mod error;
pub mod outputs;
pub mod session;
pub mod tracking;

pub use error::{Error, Result};
pub use session::{NavigationSession, NavigationSessionController};
