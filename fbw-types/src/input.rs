use serde::{Deserialize, Serialize};

use crate::curves::{linear_decay_coefficient, sign};

/// Total width of the stick null zone as a fraction of one axis half-range.
/// Half of it sits on each side of centre.
pub const NULL_ZONE: f64 = 0.10;

/// Raw stick and rudder positions captured for one tick.
///
/// Axes are in `[-1, 1]`: yoke Y +1 is full aft (nose up), yoke X +1 is full
/// right, rudder +1 is full right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PilotInput {
    pub yoke_y: f64,
    pub yoke_x: f64,
    pub rudder: f64,
}

impl PilotInput {
    pub fn new(yoke_y: f64, yoke_x: f64, rudder: f64) -> Self {
        Self { yoke_y, yoke_x, rudder }
    }

    pub fn raw_yoke_y(&self) -> f64 {
        self.yoke_y
    }

    pub fn raw_yoke_x(&self) -> f64 {
        self.yoke_x
    }

    pub fn raw_rudder(&self) -> f64 {
        self.rudder
    }

    /// Pitch axis with the null zone applied.
    pub fn filtered_yoke_y(&self) -> f64 {
        position_with_null_zone(self.yoke_y, NULL_ZONE)
    }

    /// Roll axis with the null zone applied.
    pub fn filtered_yoke_x(&self) -> f64 {
        position_with_null_zone(self.yoke_x, NULL_ZONE)
    }
}

/// Zero within `±null_zone/2` of centre, then a linear ramp to ±1 at full
/// deflection.
fn position_with_null_zone(position: f64, null_zone: f64) -> f64 {
    let s = sign(position);
    s * linear_decay_coefficient(position, s, s * null_zone / 2.0)
}
