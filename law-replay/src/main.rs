// law-replay/src/main.rs
// Replays a recorded per-tick CSV of flight state and pilot input through the
// normal law and writes the commanded surfaces plus the law branch in force.

use anyhow::{Context, Result};
use clap::Parser;
use fbw_types::{FlightState, PilotInput};
use log::{info, warn};
use normal_law::{
    EnvelopeLimits, LawConfig, NormalLaw, PitchDemand, PitchMode, PitchModeBlend, PitchOverride,
};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CLI args
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "law-replay", about = "Replay recorded ticks through the normal law")]
struct Args {
    /// Recorded ticks (CSV with a header row)
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV of commands and law trace
    #[arg(short, long)]
    output: PathBuf,

    /// JSON controller gains; omitted controllers keep their defaults
    #[arg(long)]
    gains: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One recorded tick: the flight-state snapshot, raw pilot axes and timing.
#[derive(Debug, Deserialize)]
struct TickRecord {
    t: f64,
    dt: f64,
    alpha_deg: f64,
    gforce: f64,
    ias_kts: f64,
    mach: f64,
    pitch_deg: f64,
    pitch_rate_deg_s: f64,
    roll_deg: f64,
    radio_height_ft: f64,
    vfpa_deg: f64,
    vfpa_rate_deg_s: f64,
    flaps: i32,
    on_ground: bool,
    autopilot: bool,
    vmo_kts: f64,
    mmo: f64,
    yoke_y: f64,
    yoke_x: f64,
    rudder: f64,
}

impl TickRecord {
    fn flight_state(&self) -> FlightState {
        FlightState {
            alpha_deg: self.alpha_deg,
            gforce: self.gforce,
            ias_kts: self.ias_kts,
            mach: self.mach,
            pitch_deg: self.pitch_deg,
            pitch_rate_deg_s: self.pitch_rate_deg_s,
            roll_deg: self.roll_deg,
            radio_height_ft: self.radio_height_ft,
            vfpa_deg: self.vfpa_deg,
            vfpa_rate_deg_s: self.vfpa_rate_deg_s,
            flaps: self.flaps,
            on_ground: self.on_ground,
            autopilot: self.autopilot,
            vmo_kts: self.vmo_kts,
            mmo: self.mmo,
        }
    }

    fn pilot_input(&self) -> PilotInput {
        PilotInput::new(self.yoke_y, self.yoke_x, self.rudder)
    }
}

#[derive(Debug, Serialize)]
struct CommandRecord {
    t: f64,
    elevator: f64,
    aileron: f64,
    rudder: f64,
    mode: PitchMode,
    ground_weight: f64,
    flight_weight: f64,
    flare_weight: f64,
    aoa_demand: bool,
    high_speed: bool,
    demand: Option<PitchDemand>,
    pitch_override: Option<PitchOverride>,
}

#[derive(Debug, Default, PartialEq)]
struct ReplaySummary {
    ticks: usize,
    skipped: usize,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.gains {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read {}", path.display()))?;
            LawConfig::from_json_str(&text)
                .with_context(|| format!("Invalid gains in {}", path.display()))?
        }
        None => LawConfig::default(),
    };

    let input = std::fs::File::open(&args.input)
        .with_context(|| format!("Cannot open {}", args.input.display()))?;
    let output = std::fs::File::create(&args.output)
        .with_context(|| format!("Cannot create {}", args.output.display()))?;

    let summary = replay(input, output, &config)?;
    info!(
        "replayed {} ticks ({} skipped) into {}",
        summary.ticks,
        summary.skipped,
        args.output.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// Run every record through a fresh `NormalLaw`. Rows the law rejects are
/// logged and left out of the output.
fn replay<R: Read, W: Write>(input: R, output: W, config: &LawConfig) -> Result<ReplaySummary> {
    let mut rdr = csv::Reader::from_reader(input);
    let mut wtr = csv::Writer::from_writer(output);
    let mut law = NormalLaw::new(config);
    let mut summary = ReplaySummary::default();

    for (row, result) in rdr.deserialize::<TickRecord>().enumerate() {
        // Header is line 1.
        let rec = result.with_context(|| format!("Malformed tick on line {}", row + 2))?;
        let input = rec.pilot_input();

        let cmd = match law.tick(&rec.flight_state(), &input, rec.t, rec.dt) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("skipping line {}: {e}", row + 2);
                summary.skipped += 1;
                continue;
            }
        };

        let mode = law.pitch_mode();
        let envelope = law.protections();
        wtr.serialize(CommandRecord {
            t: rec.t,
            elevator: cmd.elevator,
            aileron: cmd.aileron,
            rudder: input.raw_rudder(),
            mode: mode.mode(),
            ground_weight: mode.ground_weight(),
            flight_weight: mode.flight_weight(),
            flare_weight: mode.flare_weight(),
            aoa_demand: envelope.aoa_demand_active(),
            high_speed: envelope.high_speed_protection_active(),
            demand: law.pitch().last_demand(),
            pitch_override: law.pitch().last_override(),
        })
        .context("Failed to write command record")?;
        summary.ticks += 1;
    }

    wtr.flush().context("Failed to flush output")?;
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
