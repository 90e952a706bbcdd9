//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Open device → Bind listener → Spawn poll loop + server
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop ticking → Finish in-flight tick
//!     → Relay OFF → Release device → Stop server → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{run, start, RunningBridge};
