//! Controller tuning.
//!
//! The defaults are the gains the envelope curves were tuned against; a JSON
//! file only needs to name the controllers it overrides.

use serde::{Deserialize, Serialize};

use crate::error::{LawError, Result};

/// Output bounds and gain triple for one feedback controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub output_min: f64,
    pub output_max: f64,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub const fn new(output_min: f64, output_max: f64, kp: f64, ki: f64, kd: f64) -> Self {
        Self { output_min, output_max, kp, ki, kd }
    }

    fn validate(&self, law: &'static str) -> Result<()> {
        let all = [self.output_min, self.output_max, self.kp, self.ki, self.kd];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(LawError::InvalidGains {
                law,
                reason: "gains and bounds must be finite".to_string(),
            });
        }
        if self.output_min >= self.output_max {
            return Err(LawError::InvalidGains {
                law,
                reason: format!(
                    "output_min {} must be below output_max {}",
                    self.output_min, self.output_max
                ),
            });
        }
        Ok(())
    }
}

/// Gains for every named law controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LawConfig {
    /// AoA error -> elevator rate.
    pub aoa: PidGains,
    /// Load factor error -> elevator rate.
    pub gforce: PidGains,
    /// Vertical flight-path angle error -> elevator rate.
    pub vfpa: PidGains,
    /// Pitch rate error -> elevator rate.
    pub pitch_rate: PidGains,
    /// Bank angle error -> aileron position.
    pub roll: PidGains,
}

impl Default for LawConfig {
    fn default() -> Self {
        Self {
            aoa:        PidGains::new(-2.0, 2.0, 0.002, 0.0, 0.0002),
            gforce:     PidGains::new(-2.0, 2.0, 0.008, 0.008, 0.001),
            vfpa:       PidGains::new(-2.0, 2.0, 0.0015, 0.0020, 0.002),
            pitch_rate: PidGains::new(-2.0, 2.0, 0.01, 0.015, 0.0025),
            roll:       PidGains::new(-1.0, 1.0, 0.10, 0.0, 0.02),
        }
    }
}

impl LawConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.aoa.validate("aoa")?;
        self.gforce.validate("gforce")?;
        self.vfpa.validate("vfpa")?;
        self.pitch_rate.validate("pitch_rate")?;
        self.roll.validate("roll")?;
        Ok(())
    }
}
