use fbw_types::{FlightState, PilotInput};

use crate::pitch_mode::PitchModeBlend;
use crate::protections::EnvelopeLimits;

/// Everything a law reads during one tick.
///
/// Built fresh by the composer after the envelope and mode machine have
/// updated; laws only see their getters.
#[derive(Clone, Copy)]
pub struct LawContext<'a> {
    /// Host time in seconds.
    pub t: f64,
    pub state: &'a FlightState,
    pub input: &'a PilotInput,
    pub limits: &'a dyn EnvelopeLimits,
    pub mode: &'a dyn PitchModeBlend,
}

impl<'a> LawContext<'a> {
    pub fn new(
        t: f64,
        state: &'a FlightState,
        input: &'a PilotInput,
        limits: &'a dyn EnvelopeLimits,
        mode: &'a dyn PitchModeBlend,
    ) -> Self {
        Self { t, state, input, limits, mode }
    }
}
