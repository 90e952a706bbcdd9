//! Control surface.
//!
//! # Routes
//! ```text
//! GET  /api/status        → ControllerSnapshot
//! GET  /api/history       → PollRecord[] (newest first, ?limit=N)
//! POST /api/relay/toggle  → manual override (flip)
//! POST /api/relay/on      → manual override (ON)
//! POST /api/relay/off     → manual override (OFF)
//! GET  /health            → liveness summary
//! *                       → static dashboard files
//! ```
//!
//! # Design Decisions
//! - Handlers are thin: every write maps 1:1 to a controller call
//! - Write routes require a bearer token only when one is configured
//! - A failed relay write is a 500, never a silent success

pub mod auth;
pub mod handlers;
pub mod server;

pub use handlers::{HealthStatus, OverrideResponse};
pub use server::{AppState, HttpServer};
