//! Ground / flight / flare pitch-law selection (FCOM 1.27.20).
//!
//! Transitions are rate-limited blends between three weights. Downstream
//! laws only gate on the weights (`> 0`, `== 1`); they never mix commands
//! proportionally.

use fbw_types::curves::clamp;
use fbw_types::FlightState;
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PitchMode {
    Ground,
    Flight,
    Flare,
}

/// Blend weights for the three pitch laws, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlendWeights {
    pub ground: f64,
    pub flight: f64,
    pub flare: f64,
}

impl BlendWeights {
    pub fn sum(&self) -> f64 {
        self.ground + self.flight + self.flare
    }
}

/// Read-only view of the pitch-law mode consumed by the pitch and roll laws.
pub trait PitchModeBlend {
    fn mode(&self) -> PitchMode;
    fn ground_weight(&self) -> f64;
    fn flight_weight(&self) -> f64;
    fn flare_weight(&self) -> f64;
    /// Pitch attitude memorised when the flare blend first started.
    fn saved_flare_pitch_attitude(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PitchModeMachine {
    mode: PitchMode,
    weights: BlendWeights,
    saved_flare_pitch_attitude: f64,
}

/// Move `increment` of weight out of `blend_out` into `blend_in`, clamping each.
fn blend(blend_in: &mut f64, blend_out: &mut f64, increment: f64) {
    *blend_in = clamp(*blend_in + increment, 0.0, 1.0);
    *blend_out = clamp(*blend_out - increment, 0.0, 1.0);
}

impl PitchModeMachine {
    const GROUND_BLEND_SECONDS: f64 = 5.0;
    const FLARE_BLEND_SECONDS: f64 = 1.0;
    const FLARE_HEIGHT_FT: f64 = 50.0;
    const LIFTOFF_PITCH_DEG: f64 = 8.0;
    const TOUCHDOWN_PITCH_DEG: f64 = 2.5;

    /// On the ground, fully blended into the ground law.
    pub fn new() -> Self {
        Self::with_blend(PitchMode::Ground, BlendWeights { ground: 1.0, flight: 0.0, flare: 0.0 })
    }

    /// Start from an arbitrary mode and blend.
    pub fn with_blend(mode: PitchMode, weights: BlendWeights) -> Self {
        Self { mode, weights, saved_flare_pitch_attitude: 0.0 }
    }

    pub fn weights(&self) -> BlendWeights {
        self.weights
    }

    pub fn update(&mut self, state: &FlightState, dt: f64) {
        let previous = self.mode;
        match self.mode {
            PitchMode::Ground => self.handle_ground_transitions(state, dt),
            PitchMode::Flight => self.handle_flight_transitions(state, dt),
            PitchMode::Flare => self.handle_flare_transitions(state, dt),
        }
        if self.mode != previous {
            debug!(
                "pitch mode {previous:?} -> {:?} (ra={:.1} pitch={:.1})",
                self.mode, state.radio_height_ft, state.pitch_deg
            );
        }
    }

    fn handle_ground_transitions(&mut self, state: &FlightState, dt: f64) {
        let w = &mut self.weights;
        let increment = dt / Self::GROUND_BLEND_SECONDS;
        let airborne = !state.on_ground;

        if state.radio_height_ft > Self::FLARE_HEIGHT_FT
            || (airborne && state.pitch_deg > Self::LIFTOFF_PITCH_DEG)
        {
            blend(&mut w.flight, &mut w.ground, increment);
            if w.flight == 1.0 {
                self.mode = PitchMode::Flight;
            }
        } else {
            blend(&mut w.ground, &mut w.flight, increment);
        }
    }

    fn handle_flight_transitions(&mut self, state: &FlightState, dt: f64) {
        let w = &mut self.weights;
        let increment = dt / Self::FLARE_BLEND_SECONDS;

        if state.radio_height_ft <= Self::FLARE_HEIGHT_FT {
            if w.flare == 0.0 {
                // FCOM: the attitude at 50 ft becomes the initial flare reference.
                self.saved_flare_pitch_attitude = state.pitch_deg;
            }
            blend(&mut w.flare, &mut w.flight, increment);
            if w.flare == 1.0 {
                self.mode = PitchMode::Flare;
            }
        } else {
            blend(&mut w.flight, &mut w.flare, increment);
        }
    }

    fn handle_flare_transitions(&mut self, state: &FlightState, dt: f64) {
        let w = &mut self.weights;
        let flare_increment = dt / Self::FLARE_BLEND_SECONDS;
        let ground_increment = dt / Self::GROUND_BLEND_SECONDS;

        if state.radio_height_ft > Self::FLARE_HEIGHT_FT {
            blend(&mut w.flight, &mut w.flare, flare_increment);
            if w.flight == 1.0 {
                self.mode = PitchMode::Flight;
            }
        } else if state.on_ground && state.pitch_deg < Self::TOUCHDOWN_PITCH_DEG {
            blend(&mut w.ground, &mut w.flare, ground_increment);
            if w.ground == 1.0 {
                self.mode = PitchMode::Ground;
            }
        } else {
            // Both blends may fire on one tick; the weights need not sum to 1 afterwards.
            if w.ground > 0.0 {
                blend(&mut w.ground, &mut w.flare, ground_increment);
            }
            if w.flight > 0.0 {
                blend(&mut w.flight, &mut w.flare, flare_increment);
            }
        }
    }
}

impl Default for PitchModeMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PitchModeBlend for PitchModeMachine {
    fn mode(&self) -> PitchMode {
        self.mode
    }

    fn ground_weight(&self) -> f64 {
        self.weights.ground
    }

    fn flight_weight(&self) -> f64 {
        self.weights.flight
    }

    fn flare_weight(&self) -> f64 {
        self.weights.flare
    }

    fn saved_flare_pitch_attitude(&self) -> f64 {
        self.saved_flare_pitch_attitude
    }
}
