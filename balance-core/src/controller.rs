//! PD balance law with output clamp and tilt safety gate.
//!
//! No `dt` in the derivative: `kd` is tuned per loop period, like the
//! estimator's gyro factor. The previous error is recorded on every cycle,
//! including cycles the gate suppresses, so the first engaged cycle after a
//! large tilt sees the full jump in its derivative term.

use crate::config::ControllerConfig;

/// Safety gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateState {
    /// Inside the stability envelope, PD output reaches the motor.
    Engaged,
    /// Outside the envelope, motor held at 0 V.
    #[default]
    Disengaged,
}

impl GateState {
    pub fn is_vertical(self) -> bool {
        self == Self::Engaged
    }
}

/// Result of one controller update.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlOutput {
    /// Voltage to apply, already gated and clamped.
    pub command: f32,
    pub gate: GateState,
}

#[derive(Debug, Clone)]
pub struct BalanceController {
    kp: f32,
    kd: f32,
    setpoint: f32,
    output_limit: f32,
    tilt_limit: f32,

    previous_error: f32,
    gate: GateState,
}

impl BalanceController {
    pub fn new(config: &ControllerConfig) -> Self {
        let output_limit = libm::fabsf(config.output_limit);
        Self {
            kp: config.kp,
            kd: config.kd,
            setpoint: config.setpoint,
            output_limit,
            tilt_limit: config.tilt_limit_deg,
            previous_error: 0.0,
            gate: GateState::Disengaged,
        }
    }

    /// PD law on `error`, clamped to ±`output_limit`.
    ///
    /// A non-finite error yields 0 V and leaves the derivative history alone.
    pub fn control(&mut self, error: f32) -> f32 {
        if !error.is_finite() {
            return 0.0;
        }
        let out = self.kp * error + self.kd * (error - self.previous_error);
        self.previous_error = error;
        out.clamp(-self.output_limit, self.output_limit)
    }

    /// Run one cycle for the fused `angle` (degrees).
    ///
    /// The PD term is always evaluated so its history stays current; the
    /// gate then decides whether the command is passed on or replaced by 0.
    /// There is no hysteresis around the limit.
    pub fn update(&mut self, angle: f32) -> ControlOutput {
        let command = self.control(angle - self.setpoint);

        // NaN fails the comparison and lands outside the envelope
        if libm::fabsf(angle) <= self.tilt_limit {
            self.gate = GateState::Engaged;
            ControlOutput {
                command,
                gate: self.gate,
            }
        } else {
            self.gate = GateState::Disengaged;
            ControlOutput {
                command: 0.0,
                gate: self.gate,
            }
        }
    }

    pub fn gate(&self) -> GateState {
        self.gate
    }

    pub fn previous_error(&self) -> f32 {
        self.previous_error
    }

    pub fn output_limit(&self) -> f32 {
        self.output_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> BalanceController {
        BalanceController::new(&ControllerConfig::default())
    }

    #[test]
    fn test_starts_disengaged() {
        assert_eq!(controller().gate(), GateState::Disengaged);
    }

    #[test]
    fn test_pd_law() {
        let mut ctrl = controller();
        // first cycle: previous error is 0
        assert!((ctrl.control(2.0) - (0.6 * 2.0 + 0.05 * 2.0)).abs() < 1e-6);
        assert!((ctrl.control(3.0) - (0.6 * 3.0 + 0.05 * 1.0)).abs() < 1e-6);
        assert!((ctrl.control(3.0) - 1.8).abs() < 1e-6);
    }

    #[test]
    fn test_output_always_within_limits() {
        let mut ctrl = controller();
        let errors = [
            0.0,
            1e6,
            -1e6,
            25.0,
            -25.0,
            f32::MAX,
            f32::MIN,
            f32::INFINITY,
            f32::NEG_INFINITY,
            f32::NAN,
            3.0,
            -9.99,
        ];
        for _ in 0..3 {
            for &e in &errors {
                let out = ctrl.control(e);
                assert!((-12.0..=12.0).contains(&out), "error {} gave {}", e, out);
            }
        }
    }

    #[test]
    fn test_large_tilt_cuts_output() {
        let mut ctrl = controller();
        let out = ctrl.update(10.5);
        assert_eq!(out.command, 0.0);
        assert_eq!(out.gate, GateState::Disengaged);
        assert!(!out.gate.is_vertical());

        let out = ctrl.update(-45.0);
        assert_eq!(out.command, 0.0);
        assert_eq!(out.gate, GateState::Disengaged);
    }

    #[test]
    fn test_inside_envelope_engages() {
        let mut ctrl = controller();
        let out = ctrl.update(4.0);
        assert_eq!(out.gate, GateState::Engaged);
        assert!((out.command - (0.6 * 4.0 + 0.05 * 4.0)).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_is_hard_boundary() {
        let mut ctrl = controller();
        assert_eq!(ctrl.update(10.0).gate, GateState::Engaged);
        assert_eq!(ctrl.update(10.001).gate, GateState::Disengaged);
        assert_eq!(ctrl.update(9.999).gate, GateState::Engaged);
        assert_eq!(ctrl.update(-10.001).gate, GateState::Disengaged);
    }

    #[test]
    fn test_error_history_updates_while_disengaged() {
        let mut ctrl = controller();
        ctrl.update(2.0);
        ctrl.update(30.0);
        assert_eq!(ctrl.previous_error(), 30.0);

        // re-engaging sees the full jump from 30 to 5 in the D term
        let out = ctrl.update(5.0);
        let expected = 0.6 * 5.0 + 0.05 * (5.0 - 30.0);
        assert!((out.command - expected).abs() < 1e-6);
    }

    #[test]
    fn test_nan_angle_is_outside_envelope() {
        let mut ctrl = controller();
        let out = ctrl.update(f32::NAN);
        assert_eq!(out.gate, GateState::Disengaged);
        assert_eq!(out.command, 0.0);
    }

    #[test]
    fn test_setpoint_offsets_error_but_not_gate() {
        let mut ctrl = BalanceController::new(&ControllerConfig {
            setpoint: 1.0,
            ..Default::default()
        });
        let out = ctrl.update(1.0);
        assert_eq!(out.gate, GateState::Engaged);
        assert_eq!(out.command, 0.0);
    }
}
