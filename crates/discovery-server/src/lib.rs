//! HTTP front end for discovery token issuance.
//!
//! The binary in `main.rs` wires [`config`], [`telemetry`] and [`http`]
//! together; integration tests drive [`http::router`] directly.

pub mod config;
pub mod http;
pub mod telemetry;
