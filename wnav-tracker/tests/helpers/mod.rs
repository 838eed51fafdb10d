//! Test helper modules for wnav-tracker integration tests
//!
//! - Route builders laying out synthetic geometry with real distances
//! - Scriptable routing client and recording output collaborators
//! - In-process axum routing backend

#![allow(dead_code, unused_imports)]

pub mod mock_backend;
pub mod recorders;
pub mod routes;

pub use mock_backend::{BackendMode, MockBackend};
pub use recorders::{
    drain_events, CountingRefresh, RecordingNotifier, RecordingVoice, ScriptedRoutingClient, TestWakeLock,
};
pub use routes::{fixes_along, left_turn_route, response_for, straight_route, CORNER};
