//! Shared type definitions used by the normal-law core, the X-Plane plugin
//! and the replay tool.
//!
//! Everything here is a plain per-tick snapshot: the core reads these values
//! and never writes back into them.

pub mod curves;
pub mod input;
pub mod state;

use serde::{Deserialize, Serialize};

pub use input::PilotInput;
pub use state::FlightState;

/// Surface demand produced once per tick.
///
/// Both axes are in `[-1, 1]`: -1 is full down / full left, +1 is full up /
/// full right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlCommand {
    pub elevator: f64,
    pub aileron: f64,
}

impl ControlCommand {
    pub fn new(elevator: f64, aileron: f64) -> Self {
        Self {
            elevator: curves::clamp(elevator, -1.0, 1.0),
            aileron: curves::clamp(aileron, -1.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_clamped_on_construction() {
        let cmd = ControlCommand::new(1.7, -3.0);
        assert_eq!(cmd.elevator, 1.0);
        assert_eq!(cmd.aileron, -1.0);
    }

    #[test]
    fn default_command_is_neutral() {
        let cmd = ControlCommand::default();
        assert_eq!(cmd, ControlCommand::new(0.0, 0.0));
    }
}
