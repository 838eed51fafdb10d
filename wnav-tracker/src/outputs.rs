//! Output collaborators
//!
//! The engine never renders, speaks or notifies by itself. It calls these
//! traits, and every handle in [`Outputs`] is optional: a missing voice
//! engine or camera degrades silently and navigation continues.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};
use wnav_common::events::{RefreshKind, Severity};
use wnav_common::LatLng;

/// Speech output, fire-and-forget
pub trait VoiceOutput: Send + Sync {
    fn speak(&self, text: &str);
}

/// Map camera
pub trait Camera: Send + Sync {
    fn move_to(&self, center: LatLng, zoom: u8, duration_s: f64);
}

/// User-visible notification surface
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str, severity: Severity);
}

/// Exclusive device resource held while navigating (screen stay-on)
pub trait WakeLock: Send + Sync {
    fn acquire(&self) -> Result<()>;
    fn release(&self);
}

/// Receiver of periodic refresh ticks (traffic, weather, hazards, ETA polling)
#[async_trait]
pub trait RefreshHandler: Send + Sync {
    async fn refresh(&self, kind: RefreshKind);
}

/// Set of output handles wired into a session controller
#[derive(Clone, Default)]
pub struct Outputs {
    pub voice: Option<Arc<dyn VoiceOutput>>,
    pub camera: Option<Arc<dyn Camera>>,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub wake_lock: Option<Arc<dyn WakeLock>>,
    pub refresh: Option<Arc<dyn RefreshHandler>>,
}

impl Outputs {
    /// Logging-only outputs, used by the CLI
    pub fn tracing() -> Self {
        Self {
            voice: Some(Arc::new(TracingVoice)),
            camera: Some(Arc::new(TracingCamera)),
            notifier: Some(Arc::new(TracingNotifier)),
            wake_lock: None,
            refresh: None,
        }
    }

    pub fn speak(&self, text: &str) {
        if let Some(voice) = &self.voice {
            voice.speak(text);
        }
    }

    pub fn move_camera(&self, center: LatLng, zoom: u8, duration_s: f64) {
        if let Some(camera) = &self.camera {
            camera.move_to(center, zoom, duration_s);
        }
    }

    pub fn notify(&self, title: &str, message: &str, severity: Severity) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(title, message, severity);
        }
    }

    /// Best-effort wake lock acquisition; returns whether it is held
    pub fn acquire_wake_lock(&self) -> bool {
        match &self.wake_lock {
            Some(lock) => match lock.acquire() {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "Wake lock unavailable, continuing without it");
                    false
                }
            },
            None => false,
        }
    }

    pub fn release_wake_lock(&self) {
        if let Some(lock) = &self.wake_lock {
            lock.release();
        }
    }
}

/// Voice output that logs the spoken text
pub struct TracingVoice;

impl VoiceOutput for TracingVoice {
    fn speak(&self, text: &str) {
        info!(text, "Speak");
    }
}

/// Camera that logs moves
pub struct TracingCamera;

impl Camera for TracingCamera {
    fn move_to(&self, center: LatLng, zoom: u8, duration_s: f64) {
        info!(lat = center.lat, lng = center.lng, zoom, duration_s, "Camera move");
    }
}

/// Notifier that logs at a level matching the severity
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, message: &str, severity: Severity) {
        match severity {
            Severity::Info => info!(title, message, "Notification"),
            Severity::Warning => warn!(title, message, "Notification"),
            Severity::Error => tracing::error!(title, message, "Notification"),
        }
    }
}
