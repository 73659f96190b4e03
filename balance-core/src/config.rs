//! Tuning and layout parameters for the balance pipeline.
//!
//! Defaults reproduce the reference robot: MPU-6050 at ±250 °/s and ±2 g,
//! an 8 ms loop, α = 0.996, kp = 0.6, kd = 0.05, ±12 V output and a ±10°
//! stability envelope.

use crate::mpu6050::{AccelRange, GyroRange};
use crate::sampler::SampleLayout;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplerConfig {
    pub layout: SampleLayout,
    pub gyro_range: GyroRange,
    pub accel_range: AccelRange,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            layout: SampleLayout::Contiguous,
            gyro_range: GyroRange::Dps250,
            accel_range: AccelRange::G2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationConfig {
    /// Number of stationary gyro reads averaged into the bias.
    pub samples: u16,
    /// Pause after each read, matched to the sensor output data rate.
    pub spacing_ms: u32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            samples: 1024,
            spacing_ms: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EstimatorConfig {
    /// Weight of the gyro-integrated estimate.
    pub alpha: f32,
    /// Control loop period in seconds. The gyro integration assumes every
    /// `update` is exactly one period apart.
    pub loop_period_s: f32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            alpha: 0.996,
            loop_period_s: 0.008,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    pub kp: f32,
    pub kd: f32,
    /// Target pitch in degrees.
    pub setpoint: f32,
    /// Symmetric output clamp in volts.
    pub output_limit: f32,
    /// Actuation is cut when |angle| exceeds this many degrees.
    pub tilt_limit_deg: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            kp: 0.6,
            kd: 0.05,
            setpoint: 0.0,
            output_limit: 12.0,
            tilt_limit_deg: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BalanceConfig {
    pub sampler: SamplerConfig,
    pub calibration: CalibrationConfig,
    pub estimator: EstimatorConfig,
    pub controller: ControllerConfig,
    /// Consecutive failed samples before the motor is released.
    pub fault_limit: u32,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            sampler: SamplerConfig::default(),
            calibration: CalibrationConfig::default(),
            estimator: EstimatorConfig::default(),
            controller: ControllerConfig::default(),
            fault_limit: Self::DEFAULT_FAULT_LIMIT,
        }
    }
}

impl BalanceConfig {
    pub const DEFAULT_FAULT_LIMIT: u32 = 50;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(mut self, layout: SampleLayout) -> Self {
        self.sampler.layout = layout;
        self
    }

    pub fn with_loop_period(mut self, seconds: f32) -> Self {
        self.estimator.loop_period_s = seconds;
        self
    }

    pub fn with_fault_limit(mut self, limit: u32) -> Self {
        self.fault_limit = limit;
        self
    }
}
