//! Per-tick composer: envelope and mode first, then roll and pitch, then the
//! autopilot pass-through choice.

use fbw_types::{ControlCommand, FlightState, PilotInput};
use log::{debug, warn};

use crate::config::LawConfig;
use crate::context::LawContext;
use crate::error::{LawError, Result};
use crate::pitch::PitchLaw;
use crate::pitch_mode::PitchModeMachine;
use crate::protections::EnvelopeProtection;
use crate::roll::RollLaw;

/// Which output the composer picked for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    /// Raw pilot axes straight to the surfaces.
    PassThrough,
    /// Pitch and roll laws.
    FlyByWire,
}

/// The selection predicate: the autopilot flies the aircraft through the raw
/// axes; otherwise the normal law is in command.
pub fn command_source(state: &FlightState) -> CommandSource {
    if state.autopilot {
        CommandSource::PassThrough
    } else {
        CommandSource::FlyByWire
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalLaw {
    protections: EnvelopeProtection,
    pitch_mode: PitchModeMachine,
    pitch: PitchLaw,
    roll: RollLaw,
    command: ControlCommand,
    source: Option<CommandSource>,
}

impl NormalLaw {
    pub fn new(config: &LawConfig) -> Self {
        Self {
            protections: EnvelopeProtection::new(),
            pitch_mode: PitchModeMachine::new(),
            pitch: PitchLaw::new(config),
            roll: RollLaw::new(config),
            command: ControlCommand::default(),
            source: None,
        }
    }

    pub fn protections(&self) -> &EnvelopeProtection {
        &self.protections
    }

    pub fn pitch_mode(&self) -> &PitchModeMachine {
        &self.pitch_mode
    }

    pub fn pitch(&self) -> &PitchLaw {
        &self.pitch
    }

    pub fn roll(&self) -> &RollLaw {
        &self.roll
    }

    /// Last command produced; fed back as the current surfaces next tick.
    pub fn command(&self) -> ControlCommand {
        self.command
    }

    /// Advance every component by one tick.
    ///
    /// A non-positive or NaN `dt` is rejected before any state changes, so the
    /// caller can keep flying the previous command.
    pub fn tick(
        &mut self,
        state: &FlightState,
        input: &PilotInput,
        t: f64,
        dt: f64,
    ) -> Result<ControlCommand> {
        if !(dt > 0.0) {
            warn!("rejecting tick at t={t:.3}: dt={dt}");
            return Err(LawError::InvalidTimestep { dt });
        }

        self.protections.update(state, input, dt);
        self.pitch_mode.update(state, dt);

        let source = command_source(state);
        if self.source != Some(source) {
            debug!("command source {:?} -> {source:?}", self.source);
            self.source = Some(source);
        }

        self.command = match source {
            CommandSource::PassThrough => {
                ControlCommand::new(input.raw_yoke_y(), input.raw_yoke_x())
            }
            CommandSource::FlyByWire => {
                let ctx = LawContext::new(t, state, input, &self.protections, &self.pitch_mode);
                let aileron = self.roll.calculate(self.command.aileron, &ctx, dt);
                let elevator = self.pitch.calculate(self.command.elevator, &ctx, dt);
                ControlCommand::new(elevator, aileron)
            }
        };
        Ok(self.command)
    }
}

impl Default for NormalLaw {
    fn default() -> Self {
        Self::new(&LawConfig::default())
    }
}
