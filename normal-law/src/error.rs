use thiserror::Error;

#[derive(Debug, Error)]
pub enum LawError {
    /// The host supplied a tick duration that cannot be divided by.
    #[error("tick timestep must be positive, got {dt}")]
    InvalidTimestep { dt: f64 },

    #[error("invalid gains for the {law} controller: {reason}")]
    InvalidGains { law: &'static str, reason: String },

    #[error("failed to parse law configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LawError>;
