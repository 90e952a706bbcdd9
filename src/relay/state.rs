//! Binary relay state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Energised state of the relay output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelayState {
    /// Output driven high (relay energised).
    On,
    /// Output driven low. Also the fail-safe state.
    #[default]
    Off,
}

impl RelayState {
    /// Map an "on" flag to a state.
    pub fn from_bool(on: bool) -> Self {
        if on {
            RelayState::On
        } else {
            RelayState::Off
        }
    }

    pub fn is_on(self) -> bool {
        self == RelayState::On
    }

    /// The opposite state.
    pub fn toggled(self) -> Self {
        match self {
            RelayState::On => RelayState::Off,
            RelayState::Off => RelayState::On,
        }
    }

    /// Logic level written to the output pin.
    pub fn level(self) -> u8 {
        match self {
            RelayState::On => 1,
            RelayState::Off => 0,
        }
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayState::On => f.write_str("ON"),
            RelayState::Off => f.write_str("OFF"),
        }
    }
}
