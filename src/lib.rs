//! Typed async client for the carpool traffic-information API.
//!
//! The backend exposes live and historical road congestion readings. This
//! crate turns its REST surface into typed operations with client-side
//! defaults, fail-fast validation and a small error taxonomy:
//!
//! ```text
//! list_all / list_by_city / list_by_road_and_city / get_overview  -> Page<TrafficRecord>
//! list_by_status / search / get_popular / get_historical         -> Vec<TrafficRecord>
//! get_by_id -> TrafficRecord    get_stats -> TrafficStats
//! list_roads_by_city -> Vec<Road>    list_supported_cities -> Vec<City>
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`traffic`]: Records, normalization, transport, client and fake backend
//! - [`utils`]: Logging setup and output helpers

pub mod config;
pub mod error;
pub mod traffic;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result, TrafficError};
pub use traffic::TrafficClient;
