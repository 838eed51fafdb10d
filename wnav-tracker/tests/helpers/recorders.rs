//! Recording collaborators

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Semaphore};
use wnav_common::events::{NavEvent, RefreshKind, Severity};
use wnav_tracker::error::{Error, Result};
use wnav_tracker::outputs::{Notifier, RefreshHandler, VoiceOutput, WakeLock};
use wnav_tracker::tracking::{RouteRequest, RouteResponse, RoutingClient};

/// Routing client answering from a script
///
/// With a gate, every call blocks until [`ScriptedRoutingClient::release`].
#[derive(Default)]
pub struct ScriptedRoutingClient {
    responses: Mutex<VecDeque<Result<RouteResponse>>>,
    requests: Mutex<Vec<RouteRequest>>,
    gate: Option<Semaphore>,
}

impl ScriptedRoutingClient {
    pub fn new(responses: Vec<Result<RouteResponse>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        })
    }

    pub fn gated(responses: Vec<Result<RouteResponse>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            gate: Some(Semaphore::new(0)),
        })
    }

    /// Let one gated call proceed
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RouteRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoutingClient for ScriptedRoutingClient {
    async fn calculate_route(&self, request: RouteRequest) -> Result<RouteResponse> {
        self.requests.lock().unwrap().push(request);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Network("no scripted response".to_string())))
    }
}

#[derive(Default)]
pub struct RecordingVoice {
    spoken: Mutex<Vec<String>>,
}

impl RecordingVoice {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl VoiceOutput for RecordingVoice {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<(String, String, Severity)>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<(String, String, Severity)> {
        self.notifications.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str, severity: Severity) {
        self.notifications
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string(), severity));
    }
}

/// Wake lock counting acquire/release, optionally refusing to be acquired
#[derive(Default)]
pub struct TestWakeLock {
    pub fail: bool,
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
}

impl TestWakeLock {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl WakeLock for TestWakeLock {
    fn acquire(&self) -> Result<()> {
        if self.fail {
            return Err(Error::InvalidState("wake lock not supported".to_string()));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct CountingRefresh {
    counts: Mutex<HashMap<RefreshKind, usize>>,
}

impl CountingRefresh {
    pub fn count(&self, kind: RefreshKind) -> usize {
        self.counts.lock().unwrap().get(&kind).copied().unwrap_or(0)
    }
}

#[async_trait]
impl RefreshHandler for CountingRefresh {
    async fn refresh(&self, kind: RefreshKind) {
        *self.counts.lock().unwrap().entry(kind).or_default() += 1;
    }
}

/// Everything currently queued on an event receiver
pub fn drain_events(rx: &mut broadcast::Receiver<NavEvent>) -> Vec<NavEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
