//! In-process routing backend
//!
//! Serves `POST /api/route` on an ephemeral port. The straight line from
//! origin to destination is returned as geometry unless the backend is told
//! to fail.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use wnav_tracker::tracking::{RouteRequest, RouteResponse};

/// How the backend answers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackendMode {
    /// 200 with a straight-line route
    Ok,
    /// 200 with `success = false`
    NoRoute,
    /// 500 with a plain-text body
    ServerError,
}

struct BackendState {
    mode: BackendMode,
    hits: AtomicUsize,
}

pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start(mode: BackendMode) -> Self {
        let state = Arc::new(BackendState {
            mode,
            hits: AtomicUsize::new(0),
        });
        let app = Router::new()
            .route("/api/route", post(calculate))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn calculate(
    State(state): State<Arc<BackendState>>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, (StatusCode, String)> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    match state.mode {
        BackendMode::Ok => Ok(Json(super::response_for(&[request.origin, request.destination]))),
        BackendMode::NoRoute => Ok(Json(RouteResponse {
            success: false,
            error: Some("no route between points".to_string()),
            ..RouteResponse::default()
        })),
        BackendMode::ServerError => Err((StatusCode::INTERNAL_SERVER_ERROR, "router crashed".to_string())),
    }
}
