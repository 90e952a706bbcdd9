//! Poll history.
//!
//! # Data Flow
//! ```text
//! RelayController (evaluate / set_manual, inside its critical section)
//!     → record.rs (PollRecord)
//!     → buffer.rs (push front, evict back)
//!     → ControlSurface reads snapshot()
//! ```
//!
//! # Design Decisions
//! - In memory only; nothing survives a restart
//! - Entries are never edited, only evicted

pub mod buffer;
pub mod record;

pub use buffer::{PollHistory, DEFAULT_HISTORY_CAPACITY};
pub use record::{OutcomeKind, PollRecord};
