//! HTTP surface for the advisory engine.
//!
//! - `POST /api/advisory` runs one aggregation.
//! - `GET /api/health` reports liveness and the registered agents.

pub mod config;
pub mod cors;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{build_aggregator, load_agents, Settings};
pub use routes::router;
pub use state::AppState;
