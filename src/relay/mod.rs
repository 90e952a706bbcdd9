//! Relay control subsystem.
//!
//! # Data Flow
//! ```text
//! PollOutcome (poll loop)        set_manual / toggle (control surface)
//!         │                                   │
//!         └──────────────┬────────────────────┘
//!                        ▼
//!              controller.rs (one lock per call)
//!                 → device.rs (write pin)
//!                 → commit relay_state / last_alert
//!                 → PollHistory::append
//! ```
//!
//! # Design Decisions
//! - The controller is the only writer of the output device
//! - Unknown conditions drive the relay OFF, never ON
//! - Device failures propagate; they are never retried silently

pub mod controller;
pub mod device;
pub mod state;

pub use controller::{ControllerSnapshot, RelayController};
pub use device::{open_device, DeviceError, OutputDevice, SimulatedOutput, SimulatedProbe, SysfsGpio};
pub use state::RelayState;
