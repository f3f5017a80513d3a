//! HTTP edge: the route gate in front of page delivery.

pub mod app;
pub mod config;
pub mod gate;
pub mod middleware;

pub use config::{EdgeConfig, EdgeConfigError};
pub use gate::{GateDecision, RouteGate};
