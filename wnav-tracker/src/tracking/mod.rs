//! Per-fix tracking components
//!
//! Each component is a plain state machine fed from the session; none of them
//! performs I/O except the routing client used by [`reroute`].

pub mod destination;
pub mod deviation;
pub mod eta;
pub mod matcher;
pub mod position;
pub mod reroute;
pub mod route;
pub mod routing;
pub mod turn;
pub mod zoom;

pub use destination::DestinationAnnouncer;
pub use deviation::{DeviationCheck, DeviationMonitor};
pub use eta::EtaAnnouncer;
pub use matcher::{MatchResult, RouteMatcher};
pub use position::{PositionEvent, PositionFix, PositionHistory};
pub use reroute::RerouteCoordinator;
pub use route::{ActiveRoute, CostBreakdown, Destination, RoutePolyline, TravelMode};
pub use routing::{HttpRoutingClient, RouteRequest, RouteResponse, RoutingClient};
pub use turn::{find_next_turn, TurnAnnouncer, UpcomingTurn};
pub use zoom::{zoom_level, ZoomChange, ZoomController};
