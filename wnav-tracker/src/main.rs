//! Navigation tracker (wnav-tracker) - Main entry point
//!
//! Replays a recorded trip through the tracking engine with logging outputs,
//! or decodes an encoded route polyline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wnav_common::config::TomlConfig;
use wnav_common::events::{EventBus, NavEvent};
use wnav_common::LatLng;
use wnav_tracker::config::{routing_base_url, ConfigOverrides, SessionSettings};
use wnav_tracker::outputs::Outputs;
use wnav_tracker::tracking::{
    ActiveRoute, Destination, HttpRoutingClient, PositionEvent, PositionFix, RerouteCoordinator,
    RoutePolyline, RouteResponse, TravelMode,
};
use wnav_tracker::NavigationSessionController;

/// Command-line arguments for wnav-tracker
#[derive(Parser, Debug)]
#[command(name = "wnav-tracker")]
#[command(about = "Live navigation tracking engine")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feed a recorded trip through a navigation session
    Replay {
        /// Route JSON: a routing response with encoded geometry, or an array of [lat, lng]
        #[arg(long)]
        route: PathBuf,

        /// JSON array of recorded position fixes
        #[arg(long)]
        fixes: PathBuf,

        /// Config file (TOML)
        #[arg(short, long, env = "WNAV_CONFIG")]
        config: Option<PathBuf>,

        /// Replay speed factor relative to the recorded timestamps (0 = no delay)
        #[arg(long, default_value = "0")]
        speed: f64,

        /// Routing backend base URL, overrides the config file
        #[arg(long, env = "WNAV_ROUTING_URL")]
        routing_url: Option<String>,

        /// Travel mode for reroutes (driving, walking, cycling)
        #[arg(long)]
        mode: Option<TravelMode>,
    },

    /// Print the points of an encoded polyline
    Decode {
        /// Encoded polyline (precision 1e-5)
        encoded: String,
    },
}

/// Route fixture accepted by `replay`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RouteFile {
    Points(Vec<(f64, f64)>),
    Response {
        #[serde(flatten)]
        response: RouteResponse,
        #[serde(default)]
        destination: Option<Destination>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Replay {
            route,
            fixes,
            config,
            speed,
            routing_url,
            mode,
        } => {
            let toml_config =
                TomlConfig::resolve_and_load(config.as_deref()).context("Failed to load configuration")?;
            init_tracing(&toml_config.logging.level);

            let overrides = ConfigOverrides {
                routing_base_url: routing_url,
                mode,
                announcements_enabled: None,
            };
            replay(&toml_config, &overrides, &route, &fixes, speed).await
        }
        Command::Decode { encoded } => {
            init_tracing("info");
            decode(&encoded)
        }
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("wnav_tracker={level},wnav_common={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_route(path: &Path, mode: TravelMode) -> Result<ActiveRoute> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read route file {}", path.display()))?;
    let route_file: RouteFile =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse route file {}", path.display()))?;

    let route = match route_file {
        RouteFile::Points(points) => {
            let polyline = RoutePolyline::new(points.into_iter().map(LatLng::from).collect())?;
            let destination = Destination::new(*polyline.last());
            ActiveRoute::from_polyline(polyline, destination, mode)
        }
        RouteFile::Response { response, destination } => {
            let placeholder = Destination::new(LatLng::new(0.0, 0.0));
            let mut route = ActiveRoute::from_response(response, placeholder, mode)?;
            route.destination = destination.unwrap_or_else(|| Destination::new(*route.polyline.last()));
            route
        }
    };

    Ok(route)
}

fn load_fixes(path: &Path) -> Result<Vec<PositionFix>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixes file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse fixes file {}", path.display()))
}

async fn replay(
    config: &TomlConfig,
    overrides: &ConfigOverrides,
    route_path: &Path,
    fixes_path: &Path,
    speed: f64,
) -> Result<()> {
    let settings = SessionSettings::from_config(config, overrides).context("Invalid configuration")?;
    let route = load_route(route_path, settings.mode)?;
    let fixes = load_fixes(fixes_path)?;

    info!(
        vertices = route.polyline.len(),
        length_m = route.polyline.length_m(),
        fixes = fixes.len(),
        "Replaying trip"
    );

    let client = HttpRoutingClient::new(&routing_base_url(config, overrides), config.routing.timeout_ms)
        .context("Failed to create routing client")?;
    let event_bus = Arc::new(EventBus::default());
    let controller = NavigationSessionController::new(
        settings,
        RerouteCoordinator::new(Arc::new(client)),
        Outputs::tracing(),
        Arc::clone(&event_bus),
    );

    let mut events = event_bus.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(NavEvent::AnnouncementIssued { announcement, timestamp }) => {
                    println!("[{}] {}", timestamp.format("%H:%M:%S"), announcement.speech_text());
                }
                Ok(event) => debug!(event = event.event_type(), "Navigation event"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Announcement printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    controller.start(route).await.context("Failed to start navigation")?;
    debug!(listeners = event_bus.subscriber_count(), "Session started");

    let (tx, rx) = mpsc::channel(64);
    let feeder = tokio::spawn(async move {
        let mut previous: Option<i64> = None;
        for fix in fixes {
            if speed > 0.0 {
                if let Some(prev) = previous {
                    let gap_ms = (fix.timestamp - prev).max(0) as f64 / speed;
                    tokio::time::sleep(Duration::from_millis(gap_ms as u64)).await;
                }
            }
            previous = Some(fix.timestamp);
            if tx.send(PositionEvent::Fix(fix)).await.is_err() {
                break;
            }
        }
    });

    tokio::select! {
        result = controller.run(rx) => result.context("Replay failed")?,
        _ = shutdown_signal() => info!("Replay interrupted"),
    }

    feeder.abort();
    controller.wait_for_reroutes().await;
    controller.stop().await;

    // Closing the bus ends the printer
    drop(controller);
    drop(event_bus);
    let _ = printer.await;

    info!("Replay complete");
    Ok(())
}

fn decode(encoded: &str) -> Result<()> {
    let points = wnav_common::polyline::decode(encoded).context("Failed to decode polyline")?;
    for point in &points {
        println!("{:.5},{:.5}", point.lat, point.lng);
    }
    info!(
        points = points.len(),
        length_m = wnav_common::geo::path_length_m(&points),
        "Decoded polyline"
    );
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
