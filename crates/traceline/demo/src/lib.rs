//! Demo HTTP service around the span pipeline.
//!
//! Two endpoints exercise the whole telemetry path: each request gets its
//! own trace scope, the handler records a span with attributes/events and a
//! status, logs through the correlated logger, and the ended span rides the
//! batch pipeline to the configured collector.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use config::DemoConfig;
pub use routes::build_router;
pub use server::Server;
pub use state::AppState;
