use serde::{Deserialize, Serialize};

/// Read-only snapshot of aircraft kinematic state for one tick.
///
/// All angles are in degrees, rates in degrees/second. Missing or NaN sensor
/// values are substituted by the provider before the snapshot is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightState {
    // ── Air data ──────────────────────────────────────────────────────────────
    pub alpha_deg: f64,
    pub gforce: f64,
    pub ias_kts: f64,
    pub mach: f64,

    // ── Attitude ──────────────────────────────────────────────────────────────
    /// + is nose up.
    pub pitch_deg: f64,
    pub pitch_rate_deg_s: f64,
    /// + is right wing down.
    pub roll_deg: f64,

    // ── Flight path ───────────────────────────────────────────────────────────
    pub radio_height_ft: f64,
    pub vfpa_deg: f64,
    pub vfpa_rate_deg_s: f64,

    // ── Configuration ─────────────────────────────────────────────────────────
    /// Flap handle detent, 0 = clean, 4 = FULL.
    pub flaps: i32,
    pub on_ground: bool,
    pub autopilot: bool,

    // ── Speed limits ──────────────────────────────────────────────────────────
    pub vmo_kts: f64,
    pub mmo: f64,
}

impl Default for FlightState {
    fn default() -> Self {
        Self {
            alpha_deg: 0.0,
            gforce: 0.0,
            ias_kts: 0.0,
            mach: 0.0,
            pitch_deg: 0.0,
            pitch_rate_deg_s: 0.0,
            roll_deg: 0.0,
            radio_height_ft: 0.0,
            vfpa_deg: 0.0,
            vfpa_rate_deg_s: 0.0,
            flaps: 0,
            on_ground: true,
            autopilot: false,
            vmo_kts: f64::MAX,
            mmo: f64::MAX,
        }
    }
}

impl FlightState {
    /// Stall-warning AoA for the current flap detent (FCOM high-AoA protection table).
    pub fn alpha_floor(&self) -> f64 {
        match self.flaps {
            1 | 2 => 15.0,
            3 => 14.0,
            4 => 13.0,
            _ => 9.5,
        }
    }

    /// Protection-onset AoA.
    pub fn alpha_prot(&self) -> f64 {
        19.0 / 21.0 * self.alpha_floor()
    }

    /// Maximum achievable AoA.
    pub fn alpha_max(&self) -> f64 {
        7.0 / 6.0 * self.alpha_floor()
    }
}

/// Vertical flight-path angle from world velocity components.
///
/// Units cancel, so any consistent speed unit works. A stationary aircraft
/// reports a neutral 0°, a purely vertical one ±90°.
pub fn vfpa_from_velocity(horizontal_speed: f64, vertical_speed: f64) -> f64 {
    if horizontal_speed == 0.0 {
        if vertical_speed < 0.0 {
            return -90.0;
        }
        if vertical_speed > 0.0 {
            return 90.0;
        }
        return 0.0;
    }
    (vertical_speed / horizontal_speed).atan().to_degrees()
}
