//! One control cycle: sample → estimate → control → actuate.

use embedded_hal_async::delay::DelayNs;

use crate::calibration::GyroCalibrator;
use crate::config::BalanceConfig;
use crate::controller::{BalanceController, GateState};
use crate::error::Error;
use crate::estimator::TiltEstimator;
use crate::port::{Actuator, InertialSensorPort};
use crate::sampler::{CalibrationBias, RawSample, SensorSampler};

/// What one cycle decided.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// Fused pitch angle in degrees.
    pub angle: f32,
    /// Voltage sent to the actuator.
    pub command: f32,
    pub gate: GateState,
}

impl CycleReport {
    pub fn is_vertical(&self) -> bool {
        self.gate.is_vertical()
    }
}

/// Estimation and control state carried from one cycle to the next.
#[derive(Debug, Clone)]
pub struct ControlLoopState {
    estimator: TiltEstimator,
    controller: BalanceController,
}

impl ControlLoopState {
    pub fn new(config: &BalanceConfig) -> Self {
        Self {
            estimator: TiltEstimator::new(&config.estimator, config.sampler.gyro_range),
            controller: BalanceController::new(&config.controller),
        }
    }

    pub fn from_parts(estimator: TiltEstimator, controller: BalanceController) -> Self {
        Self {
            estimator,
            controller,
        }
    }

    /// Estimate and control for one compensated sample. Pure apart from the
    /// state it owns.
    pub fn cycle(&mut self, sample: &RawSample) -> CycleReport {
        let angle = self.estimator.update(sample);
        let out = self.controller.update(angle);
        CycleReport {
            angle,
            command: out.command,
            gate: out.gate,
        }
    }

    pub fn angle(&self) -> Option<f32> {
        self.estimator.angle()
    }

    pub fn gate(&self) -> GateState {
        self.controller.gate()
    }

    pub fn estimator(&self) -> &TiltEstimator {
        &self.estimator
    }

    pub fn controller(&self) -> &BalanceController {
        &self.controller
    }
}

/// Drives the full pipeline against real (or fake) hardware.
///
/// A failed sample skips the cycle: the fused angle and the last actuator
/// command are left as they were. After `fault_limit` consecutive failures
/// the motor is set to 0 V and released until a sample succeeds again.
pub struct Balancer<P, A> {
    sampler: SensorSampler<P>,
    actuator: A,
    state: ControlLoopState,
    calibrator: GyroCalibrator,

    fault_limit: u32,
    consecutive_faults: u32,
    motor_enabled: bool,
}

impl<P, A> Balancer<P, A>
where
    P: InertialSensorPort,
    A: Actuator,
{
    /// The actuator is zeroed and released until calibration completes.
    pub fn new(sampler: SensorSampler<P>, mut actuator: A, config: &BalanceConfig) -> Self {
        actuator.set_voltage(0.0);
        actuator.set_enabled(false);
        Self {
            sampler,
            actuator,
            state: ControlLoopState::new(config),
            calibrator: GyroCalibrator::new(&config.calibration),
            fault_limit: config.fault_limit.max(1),
            consecutive_faults: 0,
            motor_enabled: false,
        }
    }

    /// Measure and install the gyro bias, then energize the motor at 0 V.
    ///
    /// Blocks for the whole run. On a bus error the motor stays released and
    /// the sampler stays uncalibrated. The bias is measured once: a second
    /// call returns [`Error::AlreadyCalibrated`] and touches nothing.
    pub async fn calibrate<D: DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> Result<CalibrationBias, Error<P::Error>> {
        if self.sampler.is_calibrated() {
            return Err(Error::AlreadyCalibrated);
        }
        let bias = match self.calibrator.calibrate(&mut self.sampler, delay).await {
            Ok(bias) => bias,
            Err(e) => {
                self.halt();
                return Err(e);
            }
        };
        self.sampler.set_bias(bias);
        self.enable_motor();
        Ok(bias)
    }

    /// Run one control cycle.
    pub async fn step(&mut self) -> Result<CycleReport, Error<P::Error>> {
        if !self.sampler.is_calibrated() {
            return Err(Error::CalibrationIncomplete);
        }

        let sample = match self.sampler.sample().await {
            Ok(sample) => sample,
            Err(e) => {
                self.consecutive_faults = self.consecutive_faults.saturating_add(1);
                if self.consecutive_faults == self.fault_limit {
                    self.halt();
                }
                return Err(e);
            }
        };

        if self.consecutive_faults >= self.fault_limit {
            self.enable_motor();
        }
        self.consecutive_faults = 0;

        let report = self.state.cycle(&sample);
        self.actuator.set_voltage(report.command);
        Ok(report)
    }

    /// Command 0 V and release the motor.
    pub fn halt(&mut self) {
        self.actuator.set_voltage(0.0);
        self.actuator.set_enabled(false);
        self.motor_enabled = false;
    }

    fn enable_motor(&mut self) {
        if !self.motor_enabled {
            self.actuator.set_voltage(0.0);
            self.actuator.set_enabled(true);
            self.motor_enabled = true;
        }
    }

    pub fn state(&self) -> &ControlLoopState {
        &self.state
    }

    pub fn sampler(&self) -> &SensorSampler<P> {
        &self.sampler
    }

    pub fn port_mut(&mut self) -> &mut P {
        self.sampler.port_mut()
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn consecutive_faults(&self) -> u32 {
        self.consecutive_faults
    }

    /// `true` while the motor is released because of repeated bus failures.
    pub fn is_faulted(&self) -> bool {
        self.consecutive_faults >= self.fault_limit
    }

    pub fn is_motor_enabled(&self) -> bool {
        self.motor_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::SampleLayout;
    use crate::testing::{FakeActuator, FakePort, NoDelay};
    use embassy_futures::block_on;

    fn burst(lateral: i16, vertical: i16, rate: i16) -> Vec<u8> {
        [lateral, vertical, rate]
            .iter()
            .flat_map(|w| w.to_be_bytes())
            .collect()
    }

    fn balancer(port: FakePort, config: &BalanceConfig) -> Balancer<FakePort, FakeActuator> {
        let sampler = SensorSampler::new(port, SampleLayout::Contiguous);
        Balancer::new(sampler, FakeActuator::default(), config)
    }

    #[test]
    fn test_cycle_with_level_sample_keeps_zero_and_engages() {
        let mut state = ControlLoopState::new(&BalanceConfig::default());
        assert_eq!(state.angle(), None);
        let report = state.cycle(&RawSample::new(0, -1, 0.0));
        assert_eq!(report.angle, 0.0);
        assert_eq!(report.command, 0.0);
        assert!(report.is_vertical());
    }

    #[test]
    fn test_step_before_calibration_is_rejected() {
        let still = burst(0, -16384, 0);
        let mut bal = balancer(FakePort::with_bursts(&[&still]), &BalanceConfig::default());
        assert_eq!(
            block_on(bal.step()),
            Err(Error::CalibrationIncomplete)
        );
        assert!(bal.sampler().port().reads.is_empty());
        assert_eq!(bal.state().angle(), None);
    }

    #[test]
    fn test_calibrate_installs_bias_and_energizes_motor() {
        let still = burst(0, -16384, 12);
        let mut bal = balancer(FakePort::with_bursts(&[&still]), &BalanceConfig::default());
        assert!(!bal.actuator().enabled);

        let bias = block_on(bal.calibrate(&mut NoDelay::default())).unwrap();

        assert_eq!(bias.counts(), 12.0);
        assert_eq!(bal.sampler().bias(), Some(bias));
        assert!(bal.actuator().enabled);

        let report = block_on(bal.step()).unwrap();
        assert_eq!(report.angle, 0.0);
        assert_eq!(bal.actuator().voltages.last(), Some(&0.0));
    }

    #[test]
    fn test_second_calibration_is_rejected_and_keeps_bias() {
        let still = burst(0, -16384, 0);
        let drifted = burst(0, -16384, 40);
        let mut bal = balancer(FakePort::with_bursts(&[&still]), &BalanceConfig::default());
        let first = block_on(bal.calibrate(&mut NoDelay::default())).unwrap();
        for _ in 0..5 {
            block_on(bal.step()).unwrap();
        }
        bal.port_mut().bursts = [drifted].into_iter().collect();
        let reads = bal.sampler().port().reads.len();
        let toggles = bal.actuator().toggles.clone();

        let mut delay = NoDelay::default();
        assert_eq!(
            block_on(bal.calibrate(&mut delay)),
            Err(Error::AlreadyCalibrated)
        );

        assert_eq!(bal.sampler().bias(), Some(first));
        assert_eq!(bal.sampler().port().reads.len(), reads);
        assert_eq!(delay.calls, 0);
        assert_eq!(bal.actuator().toggles, toggles);
        assert!(bal.is_motor_enabled());
    }

    #[test]
    fn test_failed_calibration_leaves_motor_released() {
        let still = burst(0, -16384, 0);
        let mut port = FakePort::with_bursts(&[&still]);
        port.fail_next_reads = 1;
        let mut bal = balancer(port, &BalanceConfig::default());

        assert!(block_on(bal.calibrate(&mut NoDelay::default())).is_err());
        assert!(!bal.actuator().enabled);
        assert!(!bal.sampler().is_calibrated());
    }

    #[test]
    fn test_large_tilt_commands_zero_volts() {
        // 45° of accelerometer tilt drags the angle well past 10° after a while
        let tilted = burst(16384, -16384, 0);
        let port = FakePort::with_bursts(&[&tilted]);
        let sampler = SensorSampler::with_bias(port, SampleLayout::Contiguous, CalibrationBias::ZERO);
        let mut bal = Balancer::new(sampler, FakeActuator::default(), &BalanceConfig::default());

        let mut last = None;
        for _ in 0..2000 {
            last = Some(block_on(bal.step()).unwrap());
        }
        let report = last.unwrap();
        assert!(report.angle > 10.0);
        assert_eq!(report.command, 0.0);
        assert!(!report.is_vertical());
        assert_eq!(bal.actuator().voltages.last(), Some(&0.0));
    }

    #[test]
    fn test_transport_error_holds_angle_and_command() {
        let tilt = burst(1433, -16384, 0);
        let mut bal = balancer(FakePort::with_bursts(&[&tilt]), &BalanceConfig::default());
        block_on(bal.calibrate(&mut NoDelay::default())).unwrap();
        let report = block_on(bal.step()).unwrap();
        let writes = bal.actuator().voltages.len();

        bal.port_mut().fail_next_reads = 1;
        assert!(block_on(bal.step()).unwrap_err().is_transport());

        assert_eq!(bal.state().angle(), Some(report.angle));
        assert_eq!(bal.actuator().voltages.len(), writes);
        assert_eq!(bal.consecutive_faults(), 1);
        assert!(bal.actuator().enabled);
    }

    #[test]
    fn test_repeated_faults_release_motor_until_recovery() {
        let still = burst(0, -16384, 0);
        let config = BalanceConfig::default().with_fault_limit(3);
        let mut bal = balancer(FakePort::with_bursts(&[&still]), &config);
        block_on(bal.calibrate(&mut NoDelay::default())).unwrap();

        bal.port_mut().fail_next_reads = 4;
        for _ in 0..4 {
            assert!(block_on(bal.step()).is_err());
        }
        assert!(bal.is_faulted());
        assert!(!bal.actuator().enabled);
        assert_eq!(bal.actuator().voltages.last(), Some(&0.0));
        // released exactly once
        assert_eq!(bal.actuator().toggles, vec![false, true, false]);

        block_on(bal.step()).unwrap();
        assert!(!bal.is_faulted());
        assert!(bal.actuator().enabled);
        assert_eq!(bal.consecutive_faults(), 0);
    }
}
