//! FbwPlugin: telemetry in, normal law, surface ratios out.
//!
//! This module is free of any XPLM types so it can be fully unit-tested via
//! the `MockXplm` shim.

use std::path::Path;
use std::sync::Arc;

use fbw_types::state::vfpa_from_velocity;
use fbw_types::{ControlCommand, FlightState, PilotInput};
use log::{debug, info, warn};
use normal_law::{LawConfig, NormalLaw};

use crate::xplm_shim::{DataRefHandle, XplmApi};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Flight loop return value: call again next frame.
pub const EVERY_FRAME: f32 = -1.0;
/// Gains file, relative to the X-Plane root.
pub const CONFIG_PATH: &str = "Resources/plugins/normal-law/normal_law.json";

/// Slots of `joy_mapped_axis_value` holding the primary flight axes.
const JOY_AXIS_PITCH: usize = 1;
const JOY_AXIS_ROLL: usize = 2;
const JOY_AXIS_YAW: usize = 3;

// ── X-Plane dataref paths ─────────────────────────────────────────────────────

mod paths {
    // Air data
    pub const ALPHA_DEG: &str = "sim/flightmodel/position/alpha";
    pub const G_NORMAL:  &str = "sim/flightmodel/forces/g_nrml";
    pub const IAS_KTS:   &str = "sim/flightmodel/position/indicated_airspeed";
    pub const MACH:      &str = "sim/flightmodel/misc/machno";
    // Attitude
    pub const PITCH_DEG: &str = "sim/flightmodel/position/theta";
    pub const ROLL_DEG:  &str = "sim/flightmodel/position/phi";
    // Flight path
    pub const RADIO_HEIGHT_FT: &str = "sim/cockpit2/gauges/indicators/radio_altimeter_height_ft_pilot";
    pub const LOCAL_VX:        &str = "sim/flightmodel/position/local_vx";
    pub const LOCAL_VY:        &str = "sim/flightmodel/position/local_vy";
    pub const LOCAL_VZ:        &str = "sim/flightmodel/position/local_vz";
    // Configuration
    pub const FLAP_HANDLE_RATIO: &str = "sim/cockpit2/controls/flap_handle_deploy_ratio";
    pub const ON_GROUND:         &str = "sim/flightmodel/failures/onground_any";
    pub const AP_SERVOS_ON:      &str = "sim/cockpit2/autopilot/servos_on";
    // Speed limits
    pub const VMO_KTS: &str = "sim/aircraft/view/acf_Vne";
    pub const MMO:     &str = "sim/aircraft/view/acf_Mmo";
    // Pilot input
    pub const JOY_AXES: &str = "sim/joystick/joy_mapped_axis_value";
    // Surfaces
    pub const OVERRIDE_JOYSTICK: &str = "sim/operation/override/override_joystick";
    pub const YOKE_PITCH_RATIO:  &str = "sim/cockpit2/controls/yoke_pitch_ratio";
    pub const YOKE_ROLL_RATIO:   &str = "sim/cockpit2/controls/yoke_roll_ratio";
    pub const YOKE_YAW_RATIO:    &str = "sim/cockpit2/controls/yoke_heading_ratio";
}

// ── DataRefHandles ────────────────────────────────────────────────────────────

/// Cached dataref handles looked up once at plugin enable time.
#[derive(Default)]
pub struct DataRefHandles {
    pub alpha_deg:         Option<DataRefHandle>,
    pub g_normal:          Option<DataRefHandle>,
    pub ias_kts:           Option<DataRefHandle>,
    pub mach:              Option<DataRefHandle>,
    pub pitch_deg:         Option<DataRefHandle>,
    pub roll_deg:          Option<DataRefHandle>,
    pub radio_height_ft:   Option<DataRefHandle>,
    pub local_vx:          Option<DataRefHandle>,
    pub local_vy:          Option<DataRefHandle>,
    pub local_vz:          Option<DataRefHandle>,
    pub flap_handle_ratio: Option<DataRefHandle>,
    pub on_ground:         Option<DataRefHandle>,
    pub ap_servos_on:      Option<DataRefHandle>,
    pub vmo_kts:           Option<DataRefHandle>,
    pub mmo:               Option<DataRefHandle>,
    pub joy_axes:          Option<DataRefHandle>,
    pub override_joystick: Option<DataRefHandle>,
    pub yoke_pitch_ratio:  Option<DataRefHandle>,
    pub yoke_roll_ratio:   Option<DataRefHandle>,
    pub yoke_yaw_ratio:    Option<DataRefHandle>,
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Load controller gains, falling back to the tuned defaults when the file is
/// absent or does not validate.
pub fn load_config(path: &Path) -> LawConfig {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            info!("no gains file at {} ({e}); using defaults", path.display());
            return LawConfig::default();
        }
    };
    match LawConfig::from_json_str(&text) {
        Ok(config) => {
            info!("loaded gains from {}", path.display());
            config
        }
        Err(e) => {
            warn!("ignoring {}: {e}; using defaults", path.display());
            LawConfig::default()
        }
    }
}

/// Map a joystick axis ratio in `[0, 1]` onto a centred `[-1, 1]` deflection.
fn centred_axis(ratio: f32) -> f64 {
    (f64::from(ratio) * 2.0 - 1.0).clamp(-1.0, 1.0)
}

// ── FbwPlugin ─────────────────────────────────────────────────────────────────

pub struct FbwPlugin {
    xplm:       Arc<dyn XplmApi>,
    handles:    DataRefHandles,
    config:     LawConfig,
    law:        NormalLaw,
    /// Seconds of flight-loop time since enable.
    t:          f64,
    last_pitch: f64,
    last_vfpa:  f64,
}

impl FbwPlugin {
    pub fn new(xplm: Arc<dyn XplmApi>, config: &LawConfig) -> Self {
        FbwPlugin {
            xplm,
            handles: DataRefHandles::default(),
            config: config.clone(),
            law: NormalLaw::new(config),
            t: 0.0,
            last_pitch: 0.0,
            last_vfpa: 0.0,
        }
    }

    pub fn law(&self) -> &NormalLaw {
        &self.law
    }

    // ── Handle caching ────────────────────────────────────────────────────────

    /// (Re-)fetch all dataref handles. Call once at enable.
    pub fn find_handles(&mut self) {
        macro_rules! find {
            ($field:ident, $path:expr) => {
                self.handles.$field = self.xplm.find_dataref($path);
                if self.handles.$field.is_none() {
                    warn!("dataref not found: {}", $path);
                }
            };
        }

        find!(alpha_deg,         paths::ALPHA_DEG);
        find!(g_normal,          paths::G_NORMAL);
        find!(ias_kts,           paths::IAS_KTS);
        find!(mach,              paths::MACH);
        find!(pitch_deg,         paths::PITCH_DEG);
        find!(roll_deg,          paths::ROLL_DEG);
        find!(radio_height_ft,   paths::RADIO_HEIGHT_FT);
        find!(local_vx,          paths::LOCAL_VX);
        find!(local_vy,          paths::LOCAL_VY);
        find!(local_vz,          paths::LOCAL_VZ);
        find!(flap_handle_ratio, paths::FLAP_HANDLE_RATIO);
        find!(on_ground,         paths::ON_GROUND);
        find!(ap_servos_on,      paths::AP_SERVOS_ON);
        find!(vmo_kts,           paths::VMO_KTS);
        find!(mmo,               paths::MMO);
        find!(joy_axes,          paths::JOY_AXES);
        find!(override_joystick, paths::OVERRIDE_JOYSTICK);
        find!(yoke_pitch_ratio,  paths::YOKE_PITCH_RATIO);
        find!(yoke_roll_ratio,   paths::YOKE_ROLL_RATIO);
        find!(yoke_yaw_ratio,    paths::YOKE_YAW_RATIO);
    }

    // ── Surface ownership ─────────────────────────────────────────────────────

    /// Take the yoke ratios away from X-Plane's own joystick handling.
    ///
    /// Nothing carries over from a previous engagement: the law restarts from
    /// its initial state and the rate history is seeded from the current
    /// attitude, so the first tick sees zero pitch and VFPA rate.
    pub fn engage(&mut self) {
        self.law = NormalLaw::new(&self.config);
        self.t = 0.0;
        self.read_flight_state(0.0);
        self.set_override(true);
    }

    pub fn release(&mut self) {
        self.set_override(false);
    }

    fn set_override(&self, engaged: bool) {
        if let Some(h) = self.handles.override_joystick {
            self.xplm.set_int(h, i32::from(engaged));
            debug!("joystick override {}", if engaged { "engaged" } else { "released" });
        }
    }

    // ── Snapshot assembly ─────────────────────────────────────────────────────

    /// Read every dataref, substituting `fallback` for missing handles and NaN.
    ///
    /// Pitch rate and VFPA rate are differentiated against the previous read,
    /// so this advances that history.
    pub fn read_flight_state(&mut self, dt: f64) -> FlightState {
        let xplm = &self.xplm;
        let gf = |h: Option<DataRefHandle>, fallback: f64| {
            h.map(|h| f64::from(xplm.get_float(h)))
                .filter(|v| !v.is_nan())
                .unwrap_or(fallback)
        };
        let gi = |h: Option<DataRefHandle>, fallback: i32| h.map_or(fallback, |h| xplm.get_int(h));

        let vx = gf(self.handles.local_vx, 0.0);
        let vz = gf(self.handles.local_vz, 0.0);
        let vy = gf(self.handles.local_vy, 0.0);
        let vfpa_deg = vfpa_from_velocity(vx.hypot(vz), vy);
        let pitch_deg = gf(self.handles.pitch_deg, 0.0);

        let (pitch_rate_deg_s, vfpa_rate_deg_s) = if dt > 0.0 {
            ((pitch_deg - self.last_pitch) / dt, (vfpa_deg - self.last_vfpa) / dt)
        } else {
            (0.0, 0.0)
        };
        self.last_pitch = pitch_deg;
        self.last_vfpa = vfpa_deg;

        FlightState {
            alpha_deg:        gf(self.handles.alpha_deg, 0.0),
            gforce:           gf(self.handles.g_normal, 0.0),
            ias_kts:          gf(self.handles.ias_kts, 0.0),
            mach:             gf(self.handles.mach, 0.0),
            pitch_deg,
            pitch_rate_deg_s,
            roll_deg:         gf(self.handles.roll_deg, 0.0),
            radio_height_ft:  gf(self.handles.radio_height_ft, 0.0),
            vfpa_deg,
            vfpa_rate_deg_s,
            flaps:            (gf(self.handles.flap_handle_ratio, 0.0) * 4.0).round() as i32,
            on_ground:        gi(self.handles.on_ground, 1) != 0,
            autopilot:        gi(self.handles.ap_servos_on, 0) != 0,
            vmo_kts:          gf(self.handles.vmo_kts, f64::MAX),
            mmo:              gf(self.handles.mmo, f64::MAX),
        }
    }

    /// Raw pilot axes; unmapped axes read as centred.
    pub fn read_pilot_input(&self) -> PilotInput {
        let mut axes = [0.5f32; JOY_AXIS_YAW + 1];
        if let Some(h) = self.handles.joy_axes {
            self.xplm.get_float_array(h, 0, &mut axes);
        }
        let axis = |i: usize| if axes[i].is_nan() { 0.0 } else { centred_axis(axes[i]) };
        PilotInput::new(axis(JOY_AXIS_PITCH), axis(JOY_AXIS_ROLL), axis(JOY_AXIS_YAW))
    }

    fn write_surfaces(&self, command: ControlCommand, rudder: f64) {
        let sf = |h: Option<DataRefHandle>, v: f64| {
            if let Some(h) = h {
                self.xplm.set_float(h, v as f32);
            }
        };
        sf(self.handles.yoke_pitch_ratio, command.elevator);
        sf(self.handles.yoke_roll_ratio, command.aileron);
        sf(self.handles.yoke_yaw_ratio, rudder);
    }

    // ── Flight loop tick ──────────────────────────────────────────────────────

    /// Called from the X-Plane flight loop callback with the frame time.
    ///
    /// Returns the interval until the next call (negative = frames).
    pub fn flight_loop_tick(&mut self, dt: f32) -> f32 {
        let dt = f64::from(dt);
        let state = self.read_flight_state(dt);
        let input = self.read_pilot_input();
        self.t += dt.max(0.0);

        // A rejected tick has already been logged by the law; keep flying the
        // previous command.
        let command = self
            .law
            .tick(&state, &input, self.t, dt)
            .unwrap_or_else(|_| self.law.command());
        self.write_surfaces(command, input.raw_rudder());

        EVERY_FRAME
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
