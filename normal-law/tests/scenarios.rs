//! End-to-end scenarios through `NormalLaw::tick`.

use approx::assert_abs_diff_eq;
use fbw_types::{ControlCommand, FlightState, PilotInput};
use normal_law::{
    AntiWindupPidController, EnvelopeLimits, FeedbackController, LawConfig, NormalLaw,
    PitchDemand, PitchMode, PitchModeBlend, PitchOverride,
};

const DT: f64 = 0.25;

fn cruise() -> FlightState {
    FlightState {
        alpha_deg: 3.0,
        gforce: 1.0,
        ias_kts: 280.0,
        mach: 0.62,
        pitch_deg: 2.5,
        radio_height_ft: 12_000.0,
        vfpa_deg: -0.5,
        on_ground: false,
        vmo_kts: 350.0,
        mmo: 0.82,
        ..FlightState::default()
    }
}

/// Tick until the mode machine hands over to the flight law.
fn airborne_law(state: &FlightState) -> (NormalLaw, f64) {
    let mut law = NormalLaw::default();
    let mut t = 0.0;
    while law.pitch_mode().mode() != PitchMode::Flight {
        t += DT;
        law.tick(state, &PilotInput::new(0.0, 0.3, 0.0), t, DT).unwrap();
    }
    (law, t)
}

#[test]
fn ground_roll_uses_direct_law_even_at_high_alpha() {
    let mut law = NormalLaw::default();
    let state = FlightState { alpha_deg: 16.0, gforce: 1.0, ..FlightState::default() };
    let mut t = 0.0;
    for y in [-1.0, -0.5, 0.0, 0.02, 0.8] {
        t += 0.02;
        let cmd = law.tick(&state, &PilotInput::new(y, 0.0, 0.0), t, 0.02).unwrap();
        assert_eq!(cmd.elevator, y);
    }
    assert!(law.protections().aoa_demand_active());
    assert_eq!(law.pitch().last_demand(), Some(PitchDemand::Direct));
}

#[test]
fn aoa_demand_hysteresis() {
    let (mut law, mut t) = airborne_law(&cruise());
    assert!(!law.protections().aoa_demand_active());

    let stalled = FlightState { alpha_deg: 12.0, ..cruise() };
    t += DT;
    law.tick(&stalled, &PilotInput::new(0.0, 0.0, 0.0), t, DT).unwrap();
    assert!(law.protections().aoa_demand_active());
    assert_eq!(law.pitch().last_demand(), Some(PitchDemand::AngleOfAttack));
    assert_eq!(law.protections().max_bank_angle(), 45.0);

    t += DT;
    law.tick(&stalled, &PilotInput::new(-0.6, 0.0, 0.0), t, DT).unwrap();
    assert!(!law.protections().aoa_demand_active());
    assert_ne!(law.pitch().last_demand(), Some(PitchDemand::AngleOfAttack));
}

#[test]
fn flap_table_limits() {
    let (mut law, mut t) = airborne_law(&cruise());

    let limits = |law: &NormalLaw| {
        let p = law.protections();
        (p.min_load_factor(), p.max_load_factor(), p.max_pitch_angle())
    };
    assert_eq!(limits(&law), (-1.0, 2.5, 30.0));

    t += DT;
    law.tick(&FlightState { flaps: 4, ..cruise() }, &PilotInput::default(), t, DT).unwrap();
    assert_eq!(limits(&law), (0.0, 2.0, 25.0));
}

#[test]
fn pitch_attitude_protection_at_and_below_one_degree_over() {
    let config = LawConfig::default();
    for (pitch, corrective_rate) in [(31.0, -5.0), (30.5, -2.5)] {
        let (mut law, t) = airborne_law(&cruise());
        let before = law.command();

        let nose_high = FlightState { pitch_deg: pitch, ..cruise() };
        let cmd = law.tick(&nose_high, &PilotInput::default(), t + DT, DT).unwrap();
        assert_eq!(law.pitch().last_override(), Some(PitchOverride::PitchAboveMax));

        // The neutral-stick hold left the pitch-rate controller at zero error,
        // so the correction matches a fresh controller.
        let expected = AntiWindupPidController::new(config.pitch_rate).update(corrective_rate, DT);
        assert_abs_diff_eq!(cmd.elevator - before.elevator, expected, epsilon = 1e-12);
    }
}

#[test]
fn neutral_stick_holds_pitch_rate_then_flight_path_angle() {
    let (mut law, mut t) = airborne_law(&cruise());
    let config = LawConfig::default();

    let neutral = PilotInput::default();
    let mut state = cruise();
    let mut captured = None;

    // 6 simulated seconds of neutral stick; VFPA drifts while pitch is held.
    for tick in 1..=24 {
        state.vfpa_deg = -0.5 + 0.01 * tick as f64;
        let before = law.command();
        t += DT;
        let cmd = law.tick(&state, &neutral, t, DT).unwrap();

        if tick <= 20 {
            assert_eq!(law.pitch().last_demand(), Some(PitchDemand::HoldPitchRate));
            assert_eq!(law.pitch().held_vfpa(), state.vfpa_deg);
            if tick == 20 {
                captured = Some(state.vfpa_deg);
            }
        } else {
            assert_eq!(law.pitch().last_demand(), Some(PitchDemand::HoldVfpa));
            let held = captured.unwrap();
            assert_eq!(law.pitch().held_vfpa(), held);

            if tick == 21 {
                // First VFPA-hold tick: the controller starts fresh.
                let expected = AntiWindupPidController::new(config.vfpa)
                    .update(held - state.vfpa_deg, DT);
                assert_abs_diff_eq!(cmd.elevator - before.elevator, expected, epsilon = 1e-12);
                assert!(expected < 0.0);
            }
        }
    }
}

#[test]
fn stick_input_resets_the_neutral_hold() {
    let (mut law, mut t) = airborne_law(&cruise());
    for _ in 0..30 {
        t += DT;
        law.tick(&cruise(), &PilotInput::default(), t, DT).unwrap();
    }
    assert_eq!(law.pitch().last_demand(), Some(PitchDemand::HoldVfpa));

    t += DT;
    law.tick(&cruise(), &PilotInput::new(0.3, 0.0, 0.0), t, DT).unwrap();
    assert_eq!(law.pitch().last_demand(), Some(PitchDemand::LoadFactor));
    assert_eq!(law.pitch().held_pitch_time(), 0.0);

    t += DT;
    law.tick(&cruise(), &PilotInput::default(), t, DT).unwrap();
    assert_eq!(law.pitch().last_demand(), Some(PitchDemand::HoldPitchRate));
}

#[test]
fn approach_enters_flare_law_below_50_ft() {
    let (mut law, mut t) = airborne_law(&cruise());
    let short_final = FlightState { radio_height_ft: 45.0, pitch_deg: 3.0, flaps: 4, ..cruise() };

    t += DT;
    law.tick(&short_final, &PilotInput::default(), t, DT).unwrap();
    assert_eq!(law.pitch().last_demand(), Some(PitchDemand::Flare));
    assert_eq!(law.pitch_mode().saved_flare_pitch_attitude(), 3.0);

    for _ in 0..4 {
        t += DT;
        law.tick(&short_final, &PilotInput::default(), t, DT).unwrap();
    }
    assert_eq!(law.pitch_mode().mode(), PitchMode::Flare);
}

#[test]
fn overspeed_pitches_up() {
    let (mut law, t) = airborne_law(&cruise());
    let fast = FlightState { ias_kts: 380.0, ..cruise() };
    let before = law.command();
    let cmd = law.tick(&fast, &PilotInput::default(), t + DT, DT).unwrap();
    assert!(law.protections().high_speed_protection_active());
    assert_eq!(law.pitch().last_override(), Some(PitchOverride::HighSpeed));
    assert!(cmd.elevator > before.elevator);
}

#[test]
fn autopilot_passes_raw_axes_through() {
    let (mut law, t) = airborne_law(&cruise());
    let coupled = FlightState { autopilot: true, ..cruise() };
    let cmd = law.tick(&coupled, &PilotInput::new(0.01, -0.02, 0.5), t + DT, DT).unwrap();
    assert_eq!(cmd, ControlCommand::new(0.01, -0.02));
    assert_eq!(law.command(), cmd);
}
