//! Alert API integration.
//!
//! # Data Flow
//! ```text
//! PollLoop tick
//!     → client.rs (GET alert-status, x-api-key, bounded timeout)
//!     → classify status / decode body
//!     → PollOutcome (types.rs)
//!     → RelayController::evaluate
//! ```
//!
//! # Design Decisions
//! - Every request outcome is data, never an error
//! - The client is a trait so the loop can be driven by scripted outcomes

pub mod client;
pub mod types;

pub use client::{AlertClient, AlertClientError, HttpAlertClient, API_KEY_HEADER};
pub use types::{AlertSnapshot, FailingTarget, PollOutcome};
