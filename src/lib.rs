//! Alert-driven relay bridge.
//!
//! Polls a remote alert-status API and drives a single relay output to
//! mirror it, with a small HTTP control surface for status, history and
//! manual overrides.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐   PollOutcome   ┌──────────────────┐   write   ┌──────────────┐
//!   │   poller     │────────────────▶│ RelayController  │──────────▶│ OutputDevice │
//!   │ (interval)   │                 │  (one lock/call) │           │ sysfs / sim  │
//!   └──────┬───────┘                 └───┬─────────▲────┘           └──────────────┘
//!          │ poll()                      │ append  │ snapshot / set_manual / toggle
//!          ▼                             ▼         │
//!   ┌──────────────┐              ┌────────────┐  ┌┴─────────────┐
//!   │ AlertClient  │              │ PollHistory│◀─│ http (axum)  │
//!   │ (reqwest)    │              │  (ring)    │  │ control API  │
//!   └──────────────┘              └────────────┘  └──────────────┘
//!
//!   Cross-cutting: config · lifecycle (startup/shutdown/signals) · observability
//! ```

// Core
pub mod alert;
pub mod history;
pub mod poller;
pub mod relay;

// Control surface
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
pub use history::PollHistory;
pub use lifecycle::Shutdown;
pub use relay::RelayController;
