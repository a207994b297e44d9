//! Pitch law: direct law on the ground, AoA demand near the stall, a
//! pitch-rate flare law below 50 ft, and load-factor demand otherwise.
//!
//! Every airborne demand is an elevator *rate*: the composer adds it to the
//! previously commanded elevator. After the nominal demand is computed a
//! chain of protections may each replace it outright.

use fbw_types::curves::{clamp, linear_decay_coefficient, linear_range};
use fbw_types::FlightState;
use log::trace;
use serde::Serialize;

use crate::config::LawConfig;
use crate::context::LawContext;
use crate::pid::{AntiWindupPidController, FeedbackController};
use crate::pitch_mode::PitchMode;

/// Which nominal demand produced the elevator rate on the last tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PitchDemand {
    /// Raw stick straight to the elevator.
    Direct,
    AngleOfAttack,
    Flare,
    /// Neutral stick: pitch rate held at zero.
    HoldPitchRate,
    /// Neutral stick for longer than the settle time: flight-path angle held.
    HoldVfpa,
    /// Banked past the nominal bank angle with no pitch input: 1 g.
    RollToOneG,
    /// Pitch stick commands a load factor.
    LoadFactor,
}

/// Protection that last replaced the nominal demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PitchOverride {
    HighSpeed,
    LoadFactorMax,
    LoadFactorMin,
    PitchAboveMax,
    PitchBelowMin,
    PitchRateCapUp,
    PitchRateCapDown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PitchLaw {
    aoa: AntiWindupPidController,
    /// Shared by the load-factor demand and the load-factor limitation.
    gforce: AntiWindupPidController,
    vfpa: AntiWindupPidController,
    pitch_rate: AntiWindupPidController,

    held_pitch_time: f64,
    held_vfpa: f64,

    last_demand: Option<PitchDemand>,
    last_override: Option<PitchOverride>,
}

impl PitchLaw {
    /// Seconds of neutral stick spent holding pitch rate before the VFPA hold takes over.
    const PITCH_HOLD_SECONDS: f64 = 5.0;
    const FLARE_STICK_RATE: f64 = 5.0;
    const FLARE_DIP_HEIGHT_FT: f64 = 30.0;
    const FLARE_DIP_PITCH_DEG: f64 = -2.0;
    const FLARE_DIP_SECONDS: f64 = 8.0;
    const ATTITUDE_CORRECTION_RATE: f64 = 5.0;
    const MAX_PITCH_RATE: f64 = 30.0;
    const OVERSPEED_RECOVERY_RATE: f64 = 5.0;

    pub fn new(config: &LawConfig) -> Self {
        Self {
            aoa: AntiWindupPidController::new(config.aoa),
            gforce: AntiWindupPidController::new(config.gforce),
            vfpa: AntiWindupPidController::new(config.vfpa),
            pitch_rate: AntiWindupPidController::new(config.pitch_rate),
            held_pitch_time: 0.0,
            held_vfpa: 0.0,
            last_demand: None,
            last_override: None,
        }
    }

    pub fn last_demand(&self) -> Option<PitchDemand> {
        self.last_demand
    }

    pub fn last_override(&self) -> Option<PitchOverride> {
        self.last_override
    }

    /// Flight-path angle captured during the neutral-stick pitch hold.
    pub fn held_vfpa(&self) -> f64 {
        self.held_vfpa
    }

    pub fn held_pitch_time(&self) -> f64 {
        self.held_pitch_time
    }

    pub fn calculate(&mut self, current_elevator: f64, ctx: &LawContext<'_>, dt: f64) -> f64 {
        self.last_override = None;

        let new_elevator = if ctx.mode.mode() == PitchMode::Ground {
            self.last_demand = Some(PitchDemand::Direct);
            ctx.input.raw_yoke_y()
        } else if ctx.limits.aoa_demand_active() {
            current_elevator + self.angle_of_attack_demand(ctx, dt)
        } else if ctx.mode.flare_weight() > 0.0 {
            current_elevator + self.flare_demand(ctx, dt)
        } else {
            current_elevator + self.load_factor_demand(ctx, dt)
        };
        let new_elevator = clamp(new_elevator, -1.0, 1.0);

        let s = ctx.state;
        trace!(
            "pitch t={:.2} {:?}/{:?} p={:.2} pr={:.2} vfpa={:.2} vfpar={:.2} lf={:.3} de={:.5} e={:.4}",
            ctx.t,
            self.last_demand,
            self.last_override,
            s.pitch_deg,
            s.pitch_rate_deg_s,
            s.vfpa_deg,
            s.vfpa_rate_deg_s,
            s.gforce,
            new_elevator - current_elevator,
            new_elevator
        );
        new_elevator
    }

    // ── Nominal demands ─────────────────────────────────────────────────────

    fn angle_of_attack_demand(&mut self, ctx: &LawContext<'_>, dt: f64) -> f64 {
        self.held_pitch_time = 0.0;
        self.last_demand = Some(PitchDemand::AngleOfAttack);

        let s = ctx.state;
        let yoke_y = ctx.input.filtered_yoke_y();
        let target = if yoke_y >= 0.0 {
            linear_range(yoke_y, s.alpha_prot(), s.alpha_max())
        } else {
            // Full forward stick asks for zero AoA.
            linear_range(-yoke_y, s.alpha_prot(), 0.0)
        };

        let delta = self.aoa.update(target - s.alpha_deg, dt);
        let delta = self.load_factor_limitation(delta, ctx, dt);
        self.pitch_attitude_protection(delta, ctx, dt)
    }

    fn load_factor_demand(&mut self, ctx: &LawContext<'_>, dt: f64) -> f64 {
        let s = ctx.state;
        let yoke_x = ctx.input.filtered_yoke_x();
        let yoke_y = ctx.input.filtered_yoke_y();

        let delta = if yoke_x == 0.0 && yoke_y == 0.0 {
            if self.held_pitch_time < Self::PITCH_HOLD_SECONDS {
                // Let the flight path settle before capturing it.
                self.last_demand = Some(PitchDemand::HoldPitchRate);
                let delta = self.pitch_rate.update(0.0 - s.pitch_rate_deg_s, dt);
                self.held_vfpa = s.vfpa_deg;
                self.held_pitch_time += dt;
                delta
            } else {
                self.last_demand = Some(PitchDemand::HoldVfpa);
                self.vfpa.update(self.held_vfpa - s.vfpa_deg, dt)
            }
        } else if yoke_y == 0.0 && s.roll_deg.abs() > ctx.limits.nominal_bank_angle() {
            self.held_pitch_time = 0.0;
            self.last_demand = Some(PitchDemand::RollToOneG);
            self.gforce.update(1.0 - s.gforce, dt)
        } else if yoke_y == 0.0 {
            self.held_pitch_time = 0.0;
            self.last_demand = Some(PitchDemand::HoldPitchRate);
            self.pitch_rate.update(0.0 - s.pitch_rate_deg_s, dt)
        } else {
            self.held_pitch_time = 0.0;
            self.last_demand = Some(PitchDemand::LoadFactor);

            let normal_load_factor = 1.0 / s.roll_deg.to_radians().cos();
            let requested = if yoke_y >= 0.0 {
                linear_range(yoke_y, normal_load_factor, ctx.limits.max_load_factor())
            } else {
                linear_range(-yoke_y, normal_load_factor, ctx.limits.min_load_factor())
            };
            self.gforce.update(requested - s.gforce, dt)
        };

        let delta = self.high_speed_protection(delta, ctx, dt);
        let delta = self.load_factor_limitation(delta, ctx, dt);
        self.pitch_attitude_protection(delta, ctx, dt)
    }

    fn flare_demand(&mut self, ctx: &LawContext<'_>, dt: f64) -> f64 {
        self.last_demand = Some(PitchDemand::Flare);

        let s = ctx.state;
        let mut target = Self::FLARE_STICK_RATE * ctx.input.filtered_yoke_y();
        if s.radio_height_ft <= Self::FLARE_DIP_HEIGHT_FT {
            // FCOM: pitch is reduced to 2° nose down over 8 seconds from 30 ft.
            target += (Self::FLARE_DIP_PITCH_DEG - s.pitch_deg) / Self::FLARE_DIP_SECONDS;
        }
        self.pitch_rate.update(target - s.pitch_rate_deg_s, dt)
    }

    // ── Protections ─────────────────────────────────────────────────────────

    fn load_factor_limitation(&mut self, delta: f64, ctx: &LawContext<'_>, dt: f64) -> f64 {
        let g = ctx.state.gforce;
        let max = ctx.limits.max_load_factor();
        let min = ctx.limits.min_load_factor();

        if g > max {
            self.last_override = Some(PitchOverride::LoadFactorMax);
            self.gforce.update(max - g, dt)
        } else if g < min {
            self.last_override = Some(PitchOverride::LoadFactorMin);
            self.gforce.update(min - g, dt)
        } else {
            delta
        }
    }

    fn high_speed_protection(&mut self, delta: f64, ctx: &LawContext<'_>, dt: f64) -> f64 {
        if !ctx.limits.high_speed_protection_active() {
            return delta;
        }
        self.held_pitch_time = 0.0;
        self.last_override = Some(PitchOverride::HighSpeed);

        let s = ctx.state;
        // TODO: wire a real nose-down pilot demand in here; with 0.0 only the
        // recovery term acts.
        let pilot = reduce_nose_down_authority(0.0, s);

        let recovery_knots = Self::OVERSPEED_RECOVERY_RATE
            * linear_decay_coefficient(s.ias_kts, s.vmo_kts + 16.0, s.vmo_kts - 1.0);
        let recovery_mach = Self::OVERSPEED_RECOVERY_RATE
            * linear_decay_coefficient(s.mach, s.mmo + 0.024, s.mmo - 0.0015);
        let target = recovery_knots.max(recovery_mach);
        let recovery = self.pitch_rate.update(target - s.pitch_rate_deg_s, dt);

        pilot + recovery
    }

    fn pitch_attitude_protection(&mut self, delta: f64, ctx: &LawContext<'_>, dt: f64) -> f64 {
        let s = ctx.state;
        let pitch = s.pitch_deg;
        let rate = s.pitch_rate_deg_s;
        let max = ctx.limits.max_pitch_angle();
        let min = ctx.limits.min_pitch_angle();

        if pitch > max {
            self.last_override = Some(PitchOverride::PitchAboveMax);
            let target = -Self::ATTITUDE_CORRECTION_RATE * linear_decay_coefficient(pitch, max + 1.0, max);
            return self.pitch_rate.update(target - rate, dt);
        }
        if pitch < min {
            self.last_override = Some(PitchOverride::PitchBelowMin);
            let target = Self::ATTITUDE_CORRECTION_RATE * linear_decay_coefficient(pitch, min - 1.0, min);
            return self.pitch_rate.update(target - rate, dt);
        }

        // Rate authority shrinks to zero as the attitude limits are approached.
        let max_rate = Self::MAX_PITCH_RATE * linear_decay_coefficient(pitch, 0.0, max);
        if rate > max_rate && delta >= 0.0 {
            self.last_override = Some(PitchOverride::PitchRateCapUp);
            return self.pitch_rate.update(max_rate - rate, dt);
        }
        let min_rate = -Self::MAX_PITCH_RATE * linear_decay_coefficient(pitch, 0.0, min);
        if rate < min_rate && delta <= 0.0 {
            self.last_override = Some(PitchOverride::PitchRateCapDown);
            return self.pitch_rate.update(min_rate - rate, dt);
        }

        delta
    }
}

impl Default for PitchLaw {
    fn default() -> Self {
        Self::new(&LawConfig::default())
    }
}

/// Scale a nose-down pilot demand away as speed rises past Vmo/Mmo: no
/// authority left by Vmo+8 kt or Mmo+0.012, whichever bites harder.
fn reduce_nose_down_authority(pilot: f64, s: &FlightState) -> f64 {
    if pilot >= 0.0 {
        return pilot;
    }
    let by_knots = pilot * linear_decay_coefficient(s.ias_kts, s.vmo_kts, s.vmo_kts + 8.0);
    let by_mach = pilot * linear_decay_coefficient(s.mach, s.mmo, s.mmo + 0.012);
    by_knots.max(by_mach)
}
