//! Normal-law flight envelope protection.
//!
//! Limits follow the FCOM normal-law protection tables. Two activation flags
//! are tracked: high angle of attack (hysteretic, AoA-demand law) and high
//! speed (recomputed every tick).

use fbw_types::{FlightState, PilotInput};
use log::debug;

/// Read-only view of the current envelope, as consumed by the pitch and roll laws.
pub trait EnvelopeLimits {
    fn aoa_demand_active(&self) -> bool;
    fn high_speed_protection_active(&self) -> bool;
    /// Degrees.
    fn max_bank_angle(&self) -> f64;
    /// Spiral static stability limit in degrees.
    fn nominal_bank_angle(&self) -> f64;
    fn min_load_factor(&self) -> f64;
    fn max_load_factor(&self) -> f64;
    fn min_pitch_angle(&self) -> f64;
    fn max_pitch_angle(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeProtection {
    max_bank_angle: f64,
    nominal_bank_angle: f64,
    min_load_factor: f64,
    max_load_factor: f64,
    min_pitch_angle: f64,
    max_pitch_angle: f64,

    aoa_demand_active: bool,
    aoa_demand_deactivation_timer: f64,
    high_speed_protection_active: bool,
}

impl EnvelopeProtection {
    const MAX_BANK_ANGLE_NORMAL: f64 = 67.0;
    const MAX_BANK_ANGLE_PROTECTED: f64 = 45.0;
    const NOMINAL_BANK_ANGLE_NORMAL: f64 = 33.0;
    const NOMINAL_BANK_ANGLE_PROTECTED: f64 = 0.0;

    const MIN_LOAD_FACTOR_CLEAN: f64 = -1.0;
    const MAX_LOAD_FACTOR_CLEAN: f64 = 2.5;
    const MIN_LOAD_FACTOR_FLAPS: f64 = 0.0;
    const MAX_LOAD_FACTOR_FLAPS: f64 = 2.0;

    // TODO: FCOM progressively reduces these at low speed (30 -> 25, 25 -> 20);
    // needs V_alpha_prot / V_alpha_max estimates from flight-model testing.
    const MAX_PITCH_ANGLE: f64 = 30.0;
    const MAX_PITCH_ANGLE_FULL: f64 = 25.0;
    const MIN_PITCH_ANGLE: f64 = -15.0;

    /// Roughly 8° of forward sidestick.
    const AOA_EXIT_STICK: f64 = -0.5;
    const AOA_EXIT_HOLD_SECONDS: f64 = 0.5;

    pub fn new() -> Self {
        Self {
            max_bank_angle: Self::MAX_BANK_ANGLE_NORMAL,
            nominal_bank_angle: Self::NOMINAL_BANK_ANGLE_NORMAL,
            min_load_factor: Self::MIN_LOAD_FACTOR_CLEAN,
            max_load_factor: Self::MAX_LOAD_FACTOR_CLEAN,
            min_pitch_angle: Self::MIN_PITCH_ANGLE,
            max_pitch_angle: Self::MAX_PITCH_ANGLE,
            aoa_demand_active: false,
            aoa_demand_deactivation_timer: 0.0,
            high_speed_protection_active: false,
        }
    }

    /// Seconds accumulated toward the soft AoA-demand exit.
    pub fn deactivation_timer(&self) -> f64 {
        self.aoa_demand_deactivation_timer
    }

    pub fn update(&mut self, state: &FlightState, input: &PilotInput, dt: f64) {
        self.update_aoa_demand(state, input, dt);

        let high_speed = state.ias_kts > state.vmo_kts || state.mach > state.mmo;
        if high_speed != self.high_speed_protection_active {
            debug!(
                "high speed protection {}: ias={:.1} vmo={:.1} mach={:.3} mmo={:.3}",
                if high_speed { "active" } else { "inactive" },
                state.ias_kts, state.vmo_kts, state.mach, state.mmo
            );
        }
        self.high_speed_protection_active = high_speed;

        if self.aoa_demand_active || self.high_speed_protection_active {
            self.max_bank_angle = Self::MAX_BANK_ANGLE_PROTECTED;
            self.nominal_bank_angle = Self::NOMINAL_BANK_ANGLE_PROTECTED;
        } else {
            self.max_bank_angle = Self::MAX_BANK_ANGLE_NORMAL;
            self.nominal_bank_angle = Self::NOMINAL_BANK_ANGLE_NORMAL;
        }

        self.update_configuration_limits(state.flaps);
    }

    fn update_aoa_demand(&mut self, state: &FlightState, input: &PilotInput, dt: f64) {
        let yoke_y = input.filtered_yoke_y();
        let alpha = state.alpha_deg;

        if self.aoa_demand_active {
            let hard_exit = yoke_y <= Self::AOA_EXIT_STICK;
            let soft_exit = self.aoa_demand_deactivation_timer >= Self::AOA_EXIT_HOLD_SECONDS;
            if hard_exit || soft_exit {
                debug!("aoa demand inactive: yoke_y={yoke_y:.2} alpha={alpha:.2}");
                self.aoa_demand_active = false;
                self.aoa_demand_deactivation_timer = 0.0;
            } else if yoke_y < 0.0 && alpha < state.alpha_max() {
                self.aoa_demand_deactivation_timer += dt;
            } else {
                self.aoa_demand_deactivation_timer = 0.0;
            }
        } else {
            let above_prot = yoke_y >= 0.0 && alpha > state.alpha_prot();
            let at_max = alpha >= state.alpha_max();
            if above_prot || at_max {
                debug!(
                    "aoa demand active: alpha={alpha:.2} prot={:.2} max={:.2}",
                    state.alpha_prot(),
                    state.alpha_max()
                );
                self.aoa_demand_active = true;
                self.aoa_demand_deactivation_timer = 0.0;
            }
        }
    }

    fn update_configuration_limits(&mut self, flaps: i32) {
        match flaps {
            0 => {
                self.min_load_factor = Self::MIN_LOAD_FACTOR_CLEAN;
                self.max_load_factor = Self::MAX_LOAD_FACTOR_CLEAN;
                self.max_pitch_angle = Self::MAX_PITCH_ANGLE;
            }
            1..=3 => {
                self.min_load_factor = Self::MIN_LOAD_FACTOR_FLAPS;
                self.max_load_factor = Self::MAX_LOAD_FACTOR_FLAPS;
                self.max_pitch_angle = Self::MAX_PITCH_ANGLE;
            }
            4 => {
                self.min_load_factor = Self::MIN_LOAD_FACTOR_FLAPS;
                self.max_load_factor = Self::MAX_LOAD_FACTOR_FLAPS;
                self.max_pitch_angle = Self::MAX_PITCH_ANGLE_FULL;
            }
            _ => {}
        }
    }
}

impl Default for EnvelopeProtection {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeLimits for EnvelopeProtection {
    fn aoa_demand_active(&self) -> bool {
        self.aoa_demand_active
    }

    fn high_speed_protection_active(&self) -> bool {
        self.high_speed_protection_active
    }

    fn max_bank_angle(&self) -> f64 {
        self.max_bank_angle
    }

    fn nominal_bank_angle(&self) -> f64 {
        self.nominal_bank_angle
    }

    fn min_load_factor(&self) -> f64 {
        self.min_load_factor
    }

    fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    fn min_pitch_angle(&self) -> f64 {
        self.min_pitch_angle
    }

    fn max_pitch_angle(&self) -> f64 {
        self.max_pitch_angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 0.1;

    fn clean(alpha_deg: f64) -> FlightState {
        FlightState { alpha_deg, on_ground: false, radio_height_ft: 3000.0, ..FlightState::default() }
    }

    fn stick(yoke_y: f64) -> PilotInput {
        PilotInput::new(yoke_y, 0.0, 0.0)
    }

    #[test]
    fn flap_table_limits() {
        let mut p = EnvelopeProtection::new();
        let mut s = clean(0.0);

        s.flaps = 0;
        p.update(&s, &stick(0.0), DT);
        assert_eq!((p.min_load_factor(), p.max_load_factor(), p.max_pitch_angle()), (-1.0, 2.5, 30.0));

        s.flaps = 2;
        p.update(&s, &stick(0.0), DT);
        assert_eq!((p.min_load_factor(), p.max_load_factor(), p.max_pitch_angle()), (0.0, 2.0, 30.0));

        s.flaps = 4;
        p.update(&s, &stick(0.0), DT);
        assert_eq!((p.min_load_factor(), p.max_load_factor(), p.max_pitch_angle()), (0.0, 2.0, 25.0));
        assert_eq!(p.min_pitch_angle(), -15.0);
    }

    #[test]
    fn invalid_flap_index_keeps_previous_limits() {
        let mut p = EnvelopeProtection::new();
        let mut s = clean(0.0);
        s.flaps = 4;
        p.update(&s, &stick(0.0), DT);
        s.flaps = 9;
        p.update(&s, &stick(0.0), DT);
        assert_eq!(p.max_pitch_angle(), 25.0);
        assert_eq!(p.min_load_factor(), 0.0);
    }

    #[test]
    fn alpha_max_activates_regardless_of_stick() {
        let mut p = EnvelopeProtection::new();
        let s = clean(12.0); // alpha_max clean = 11.08
        p.update(&s, &stick(-0.3), DT);
        assert!(p.aoa_demand_active());
        assert_eq!(p.max_bank_angle(), 45.0);
        assert_eq!(p.nominal_bank_angle(), 0.0);
    }

    #[test]
    fn alpha_prot_needs_stick_not_forward() {
        let mut p = EnvelopeProtection::new();
        let s = clean(9.0); // prot 8.6, max 11.08
        p.update(&s, &stick(-0.3), DT);
        assert!(!p.aoa_demand_active());
        p.update(&s, &stick(0.0), DT);
        assert!(p.aoa_demand_active());
    }

    #[test]
    fn hard_forward_stick_exits_immediately() {
        let mut p = EnvelopeProtection::new();
        p.update(&clean(12.0), &stick(0.0), DT);
        assert!(p.aoa_demand_active());
        p.update(&clean(12.0), &stick(-0.6), DT);
        assert!(!p.aoa_demand_active());
        assert_eq!(p.deactivation_timer(), 0.0);
    }

    #[test]
    fn soft_exit_after_half_second_of_forward_stick() {
        let mut p = EnvelopeProtection::new();
        p.update(&clean(12.0), &stick(0.0), 0.25);
        assert!(p.aoa_demand_active());

        // Light forward stick below alpha max: timer builds 0.25 -> 0.5.
        p.update(&clean(9.0), &stick(-0.2), 0.25);
        p.update(&clean(9.0), &stick(-0.2), 0.25);
        assert!(p.aoa_demand_active());
        assert_eq!(p.deactivation_timer(), 0.5);

        p.update(&clean(9.0), &stick(-0.2), 0.25);
        assert!(!p.aoa_demand_active());
    }

    #[test]
    fn soft_exit_timer_resets_when_stick_released() {
        let mut p = EnvelopeProtection::new();
        p.update(&clean(12.0), &stick(0.0), 0.25);
        p.update(&clean(9.0), &stick(-0.2), 0.25);
        assert_eq!(p.deactivation_timer(), 0.25);
        p.update(&clean(9.0), &stick(0.0), 0.25);
        assert_eq!(p.deactivation_timer(), 0.0);
        assert!(p.aoa_demand_active());
    }

    #[test]
    fn high_speed_has_no_hysteresis() {
        let mut p = EnvelopeProtection::new();
        let mut s = clean(2.0);
        s.vmo_kts = 350.0;
        s.mmo = 0.82;

        s.ias_kts = 351.0;
        p.update(&s, &stick(0.0), DT);
        assert!(p.high_speed_protection_active());
        assert_eq!(p.max_bank_angle(), 45.0);

        s.ias_kts = 349.0;
        s.mach = 0.83;
        p.update(&s, &stick(0.0), DT);
        assert!(p.high_speed_protection_active());

        s.mach = 0.80;
        p.update(&s, &stick(0.0), DT);
        assert!(!p.high_speed_protection_active());
        assert_eq!((p.max_bank_angle(), p.nominal_bank_angle()), (67.0, 33.0));
    }
}
