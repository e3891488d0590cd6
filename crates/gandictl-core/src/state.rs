//! Generic machine state and the mapping from provider VM states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider-independent lifecycle state of a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MachineState {
    #[default]
    None,
    Running,
    Paused,
    Saved,
    Stopped,
    Stopping,
    Starting,
    Error,
    Timeout,
}

impl MachineState {
    /// Map a provider VM state string onto the generic state.
    ///
    /// Unknown strings map to [`MachineState::None`].
    pub fn from_provider(state: &str) -> Self {
        match state {
            "being_created" => MachineState::Starting,
            "paused" | "locked" | "legally_locked" => MachineState::Paused,
            "running" => MachineState::Running,
            "halted" | "deleted" => MachineState::Stopped,
            "invalid" => MachineState::Error,
            _ => MachineState::None,
        }
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MachineState::None => "",
            MachineState::Running => "Running",
            MachineState::Paused => "Paused",
            MachineState::Saved => "Saved",
            MachineState::Stopped => "Stopped",
            MachineState::Stopping => "Stopping",
            MachineState::Starting => "Starting",
            MachineState::Error => "Error",
            MachineState::Timeout => "Timeout",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_state_mapping() {
        let cases = [
            ("being_created", MachineState::Starting),
            ("paused", MachineState::Paused),
            ("locked", MachineState::Paused),
            ("legally_locked", MachineState::Paused),
            ("running", MachineState::Running),
            ("halted", MachineState::Stopped),
            ("deleted", MachineState::Stopped),
            ("invalid", MachineState::Error),
        ];
        for (provider, expected) in cases {
            assert_eq!(MachineState::from_provider(provider), expected, "{provider}");
        }
    }

    #[test]
    fn test_unknown_provider_state_is_none() {
        assert_eq!(MachineState::from_provider(""), MachineState::None);
        assert_eq!(MachineState::from_provider("Running"), MachineState::None);
        assert_eq!(MachineState::from_provider("migrating"), MachineState::None);
    }

    #[test]
    fn test_display() {
        assert_eq!(MachineState::Running.to_string(), "Running");
        assert_eq!(MachineState::None.to_string(), "");
    }
}
