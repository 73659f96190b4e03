//! Complementary filter for the pitch angle.
//!
//! Two estimates are blended every cycle. Integrating the gyro rate follows
//! fast motion but drifts with any residual bias; the accelerometer tilt is
//! drift-free but corrupted by linear acceleration and vibration. The filter
//! weights the integrated estimate by `alpha` and pulls it toward the
//! accelerometer tilt by `1 - alpha`. The gain is fixed; there is no noise
//! model.
//!
//! Integration assumes `update` runs exactly once per configured loop
//! period. The counts-to-degrees factor is derived from that period and the
//! gyro full-scale range when the estimator is built.

use core::f32::consts::PI;

use crate::config::EstimatorConfig;
use crate::mpu6050::GyroRange;
use crate::sampler::RawSample;

const RAD_TO_DEG: f32 = 180.0 / PI;

/// Tilt implied by the gravity vector alone, in degrees.
///
/// `vertical` is negated so a level sensor (gravity along −Z) reads 0°.
pub fn accel_angle(lateral: i16, vertical: i16) -> f32 {
    libm::atan2f(lateral as f32, -(vertical as f32)) * RAD_TO_DEG
}

/// Degrees travelled in one loop period per gyro count.
pub fn gyro_conversion(range: GyroRange, loop_period_s: f32) -> f32 {
    loop_period_s / range.lsb_per_dps()
}

/// Owns the fused pitch angle.
#[derive(Debug, Clone)]
pub struct TiltEstimator {
    alpha: f32,
    deg_per_count: f32,
    angle: Option<f32>,
}

impl TiltEstimator {
    pub fn new(config: &EstimatorConfig, gyro_range: GyroRange) -> Self {
        Self {
            alpha: config.alpha,
            deg_per_count: gyro_conversion(gyro_range, config.loop_period_s),
            angle: None,
        }
    }

    /// Start integration from a known angle instead of 0°.
    pub fn with_initial_angle(mut self, degrees: f32) -> Self {
        self.angle = Some(degrees);
        self
    }

    /// Fold one sample into the fused angle and return it.
    pub fn update(&mut self, sample: &RawSample) -> f32 {
        let previous = self.angle.unwrap_or(0.0);
        let gyro = previous - sample.pitch_rate * self.deg_per_count;
        let accel = accel_angle(sample.lateral_accel, sample.vertical_accel);
        let fused = gyro * self.alpha + accel * (1.0 - self.alpha);
        self.angle = Some(fused);
        fused
    }

    /// Fused angle in degrees, `None` until the first [`update`](Self::update).
    pub fn angle(&self) -> Option<f32> {
        self.angle
    }

    pub fn conversion_factor(&self) -> f32 {
        self.deg_per_count
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}
