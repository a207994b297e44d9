//! Normal-law fly-by-wire core.
//!
//! One [`NormalLaw::tick`] per simulator frame: envelope protection and the
//! ground/flight/flare mode machine update from the snapshot, then the roll
//! and pitch laws turn pilot input into bounded surface commands.
//!
//! Nothing here blocks or performs I/O; every value a law needs arrives
//! through [`LawContext`].

pub mod config;
pub mod context;
pub mod error;
pub mod law;
pub mod pid;
pub mod pitch;
pub mod pitch_mode;
pub mod protections;
pub mod roll;

pub use config::{LawConfig, PidGains};
pub use context::LawContext;
pub use error::{LawError, Result};
pub use law::{command_source, CommandSource, NormalLaw};
pub use pid::{AntiWindupPidController, FeedbackController, PidController};
pub use pitch::{PitchDemand, PitchLaw, PitchOverride};
pub use pitch_mode::{BlendWeights, PitchMode, PitchModeBlend, PitchModeMachine};
pub use protections::{EnvelopeLimits, EnvelopeProtection};
pub use roll::RollLaw;
