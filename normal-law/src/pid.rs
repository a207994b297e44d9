//! Proportional-integral-derivative controllers shared by every control law.

use fbw_types::curves::{clamp, sign};

use crate::config::PidGains;

/// A stateful controller mapping an error signal to a bounded output.
pub trait FeedbackController {
    /// Advance one tick and commit the new integral, last error and last output.
    ///
    /// `dt` must be positive; callers go through the guarded law tick.
    fn update(&mut self, error: f64, dt: f64) -> f64;

    /// What `update` would return, without touching persisted state.
    fn query(&self, error: f64, dt: f64) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidController {
    gains: PidGains,
    integral: f64,
    last_error: f64,
    last_output: f64,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral: 0.0,
            last_error: 0.0,
            last_output: 0.0,
        }
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn last_error(&self) -> f64 {
        self.last_error
    }

    pub fn last_output(&self) -> f64 {
        self.last_output
    }

    /// `true` when the last committed output lies outside the output bounds.
    pub fn is_saturated(&self) -> bool {
        !(self.last_output >= self.gains.output_min && self.last_output <= self.gains.output_max)
    }

    fn step(&mut self, error: f64, dt: f64, integrate: bool) -> f64 {
        debug_assert!(dt > 0.0, "controller stepped with dt = {dt}");
        let g = self.gains;

        let p = g.kp * error;
        if integrate {
            self.integral += error * dt;
        }
        let i = g.ki * self.integral;
        let d = g.kd * ((error - self.last_error) / dt);

        let output = clamp(p + i + d, g.output_min, g.output_max);
        self.last_output = output;
        self.last_error = error;
        output
    }
}

impl FeedbackController for PidController {
    fn update(&mut self, error: f64, dt: f64) -> f64 {
        self.step(error, dt, true)
    }

    fn query(&self, error: f64, dt: f64) -> f64 {
        let mut probe = *self;
        probe.update(error, dt)
    }
}

/// PID whose integral only moves while the last output is saturated and the
/// new error keeps pushing in the same direction.
///
/// Outside that case the integral is held for the tick. Since committed
/// outputs are always clamped into bounds, a controller built from valid
/// gains keeps its integral where it started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AntiWindupPidController {
    inner: PidController,
}

impl AntiWindupPidController {
    pub fn new(gains: PidGains) -> Self {
        Self { inner: PidController::new(gains) }
    }

    pub fn integral(&self) -> f64 {
        self.inner.integral()
    }

    pub fn last_error(&self) -> f64 {
        self.inner.last_error()
    }

    pub fn last_output(&self) -> f64 {
        self.inner.last_output()
    }

    fn integral_frozen(&self, error: f64) -> bool {
        !self.inner.is_saturated() || sign(error) != sign(self.inner.last_output)
    }
}

impl FeedbackController for AntiWindupPidController {
    fn update(&mut self, error: f64, dt: f64) -> f64 {
        let integrate = !self.integral_frozen(error);
        self.inner.step(error, dt, integrate)
    }

    fn query(&self, error: f64, dt: f64) -> f64 {
        let mut probe = *self;
        probe.update(error, dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn gains(kp: f64, ki: f64, kd: f64) -> PidGains {
        PidGains::new(-10.0, 10.0, kp, ki, kd)
    }

    #[test]
    fn proportional_only() {
        let mut pid = PidController::new(gains(2.0, 0.0, 0.0));
        assert_abs_diff_eq!(pid.update(1.5, 0.1), 3.0);
    }

    #[test]
    fn integral_accumulates_error_times_dt() {
        let mut pid = PidController::new(gains(0.0, 1.0, 0.0));
        pid.update(1.0, 0.5);
        pid.update(1.0, 0.5);
        let out = pid.update(1.0, 0.5);
        assert_abs_diff_eq!(out, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(pid.integral(), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn derivative_uses_last_error() {
        let mut pid = PidController::new(gains(0.0, 0.0, 1.0));
        // From a zero last error, a step of 2 over 0.5 s is a rate of 4.
        assert_abs_diff_eq!(pid.update(2.0, 0.5), 4.0);
        assert_abs_diff_eq!(pid.update(2.0, 0.5), 0.0);
        assert_eq!(pid.last_error(), 2.0);
    }

    #[test]
    fn output_is_clamped_and_committed() {
        let mut pid = PidController::new(PidGains::new(-1.0, 1.0, 5.0, 0.0, 0.0));
        assert_eq!(pid.update(3.0, 0.1), 1.0);
        assert_eq!(pid.last_output(), 1.0);
        assert!(!pid.is_saturated());
        assert_eq!(pid.update(-3.0, 0.1), -1.0);
    }

    #[test]
    fn query_leaves_state_untouched() {
        let mut pid = PidController::new(gains(0.4, 0.3, 0.2));
        pid.update(0.7, 0.05);
        let before = pid;

        let q1 = pid.query(1.2, 0.05);
        let q2 = pid.query(1.2, 0.05);
        assert_eq!(q1, q2);
        assert_eq!(pid, before);

        let mut twin = before;
        assert_eq!(pid.update(1.2, 0.05), twin.update(1.2, 0.05));
        assert_eq!(pid, twin);
    }

    #[test]
    fn anti_windup_freezes_integral_within_bounds() {
        let mut pid = AntiWindupPidController::new(gains(0.1, 1.0, 0.0));
        let before = pid.integral();
        pid.update(0.8, 0.1);
        pid.update(0.8, 0.1);
        assert_eq!(pid.integral(), before);
    }

    #[test]
    fn anti_windup_integrates_when_saturated_in_same_direction() {
        let mut pid = AntiWindupPidController::new(gains(0.0, 1.0, 0.0));
        pid.inner.last_output = 12.0; // beyond output_max
        pid.update(2.0, 0.25);
        assert_abs_diff_eq!(pid.integral(), 0.5);
    }

    #[test]
    fn anti_windup_freezes_when_error_reverses_while_saturated() {
        let mut pid = AntiWindupPidController::new(gains(0.0, 1.0, 0.0));
        pid.inner.last_output = 12.0;
        pid.update(-2.0, 0.25);
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn anti_windup_query_is_pure() {
        let mut pid = AntiWindupPidController::new(gains(0.3, 0.2, 0.1));
        pid.update(0.4, 0.1);
        let before = pid;
        let q = pid.query(-0.9, 0.1);
        assert_eq!(pid, before);
        assert_eq!(pid.update(-0.9, 0.1), q);
    }
}
