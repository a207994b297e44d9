//! Roll law: the sidestick commands a roll rate into a persisted target bank
//! angle, which the roll controller then tracks.

use fbw_types::curves::{clamp, sign};

use crate::config::LawConfig;
use crate::context::LawContext;
use crate::pid::{FeedbackController, PidController};
use crate::pitch_mode::PitchMode;

#[derive(Debug, Clone, PartialEq)]
pub struct RollLaw {
    target_bank_deg: f64,
    controller: PidController,
}

impl RollLaw {
    /// Degrees/second at full lateral stick.
    const STICK_ROLL_RATE: f64 = 15.0;
    /// Degrees/second back toward the nominal bank angle with the stick released.
    const RETURN_ROLL_RATE: f64 = 5.0;

    pub fn new(config: &LawConfig) -> Self {
        Self { target_bank_deg: 0.0, controller: PidController::new(config.roll) }
    }

    pub fn target_bank_deg(&self) -> f64 {
        self.target_bank_deg
    }

    /// Aileron position for this tick. The previous aileron is not used: the
    /// roll controller produces a position, not a rate.
    pub fn calculate(&mut self, _current_aileron: f64, ctx: &LawContext<'_>, dt: f64) -> f64 {
        if ctx.mode.mode() == PitchMode::Ground {
            return ctx.input.raw_yoke_x();
        }

        let yoke_x = ctx.input.filtered_yoke_x();
        let nominal = ctx.limits.nominal_bank_angle();
        if yoke_x == 0.0 {
            if self.target_bank_deg.abs() > nominal {
                let side = sign(self.target_bank_deg);
                let mut target = self.target_bank_deg - side * Self::RETURN_ROLL_RATE * dt;
                if target * side < nominal {
                    target = side * nominal;
                }
                self.target_bank_deg = target;
            }
        } else {
            let max = ctx.limits.max_bank_angle();
            self.target_bank_deg =
                clamp(self.target_bank_deg + Self::STICK_ROLL_RATE * yoke_x * dt, -max, max);
        }

        self.controller.update(self.target_bank_deg - ctx.state.roll_deg, dt)
    }
}

impl Default for RollLaw {
    fn default() -> Self {
        Self::new(&LawConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch_mode::{BlendWeights, PitchModeMachine};
    use crate::protections::EnvelopeProtection;
    use approx::assert_abs_diff_eq;
    use fbw_types::{FlightState, PilotInput};

    const DT: f64 = 0.1;

    fn flight_mode() -> PitchModeMachine {
        PitchModeMachine::with_blend(PitchMode::Flight, BlendWeights { ground: 0.0, flight: 1.0, flare: 0.0 })
    }

    fn airborne() -> FlightState {
        FlightState { on_ground: false, radio_height_ft: 5000.0, alpha_deg: 3.0, ..FlightState::default() }
    }

    fn run(law: &mut RollLaw, limits: &EnvelopeProtection, input: PilotInput, ticks: usize) -> f64 {
        let state = airborne();
        let mode = flight_mode();
        let mut aileron = 0.0;
        for _ in 0..ticks {
            let ctx = LawContext::new(0.0, &state, &input, limits, &mode);
            aileron = law.calculate(aileron, &ctx, DT);
        }
        aileron
    }

    #[test]
    fn ground_mode_passes_raw_stick() {
        let mut law = RollLaw::default();
        let limits = EnvelopeProtection::new();
        let mode = PitchModeMachine::new();
        let state = FlightState::default();
        let input = PilotInput::new(0.0, 0.04, 0.0);
        let ctx = LawContext::new(0.0, &state, &input, &limits, &mode);
        assert_eq!(law.calculate(0.5, &ctx, DT), 0.04);
        assert_eq!(law.target_bank_deg(), 0.0);
    }

    #[test]
    fn full_stick_rolls_fifteen_degrees_per_second() {
        let mut law = RollLaw::default();
        let limits = EnvelopeProtection::new();
        let aileron = run(&mut law, &limits, PilotInput::new(0.0, 1.0, 0.0), 10);
        assert_abs_diff_eq!(law.target_bank_deg(), 15.0, epsilon = 1e-9);

        let mut pid = PidController::new(LawConfig::default().roll);
        for i in 1..=10 {
            pid.update(1.5 * i as f64, DT);
        }
        assert_abs_diff_eq!(aileron, pid.last_output(), epsilon = 1e-9);
    }

    #[test]
    fn target_is_clamped_to_max_bank() {
        let mut law = RollLaw::default();
        let limits = EnvelopeProtection::new();
        run(&mut law, &limits, PilotInput::new(0.0, -1.0, 0.0), 60);
        assert_eq!(law.target_bank_deg(), -67.0);
    }

    #[test]
    fn released_stick_returns_to_nominal_bank_without_overshoot() {
        let mut law = RollLaw { target_bank_deg: 34.0, ..RollLaw::default() };
        let limits = EnvelopeProtection::new();

        run(&mut law, &limits, PilotInput::default(), 1);
        assert_abs_diff_eq!(law.target_bank_deg(), 33.5, epsilon = 1e-12);

        run(&mut law, &limits, PilotInput::default(), 5);
        assert_eq!(law.target_bank_deg(), 33.0);
    }

    #[test]
    fn released_stick_holds_bank_within_nominal() {
        let mut law = RollLaw { target_bank_deg: -20.0, ..RollLaw::default() };
        let limits = EnvelopeProtection::new();
        run(&mut law, &limits, PilotInput::default(), 10);
        assert_eq!(law.target_bank_deg(), -20.0);
    }

    #[test]
    fn protected_nominal_bank_of_zero_does_not_overshoot() {
        let mut law = RollLaw { target_bank_deg: -0.2, ..RollLaw::default() };
        let mut limits = EnvelopeProtection::new();
        // Alpha max forces the protected bank limits (45° / 0°).
        let stalled = FlightState { alpha_deg: 20.0, ..airborne() };
        limits.update(&stalled, &PilotInput::default(), DT);

        run(&mut law, &limits, PilotInput::default(), 1);
        assert_eq!(law.target_bank_deg(), 0.0);
    }
}
