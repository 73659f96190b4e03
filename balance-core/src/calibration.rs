//! Startup gyro bias estimation.

use embedded_hal_async::delay::DelayNs;

use crate::config::CalibrationConfig;
use crate::error::Error;
use crate::port::InertialSensorPort;
use crate::sampler::{CalibrationBias, SensorSampler};

/// Averages stationary pitch-rate reads into a [`CalibrationBias`].
///
/// The robot has to be held still for the whole run; nothing here can tell
/// whether it was.
#[derive(Debug, Clone, Copy)]
pub struct GyroCalibrator {
    samples: u16,
    spacing_ms: u32,
}

impl GyroCalibrator {
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            samples: config.samples,
            spacing_ms: config.spacing_ms,
        }
    }

    pub fn samples(&self) -> u16 {
        self.samples
    }

    /// Wall time the run will take, ignoring bus time.
    pub fn duration_ms(&self) -> u32 {
        self.samples as u32 * self.spacing_ms
    }

    /// Run the full calibration. Any bus error aborts the run; a partial
    /// average is never returned.
    pub async fn calibrate<P, D>(
        &self,
        sampler: &mut SensorSampler<P>,
        delay: &mut D,
    ) -> Result<CalibrationBias, Error<P::Error>>
    where
        P: InertialSensorPort,
        D: DelayNs,
    {
        if self.samples == 0 {
            return Ok(CalibrationBias::ZERO);
        }

        let mut sum: i64 = 0;
        for _ in 0..self.samples {
            let raw = sampler.read_raw().await?;
            sum += i64::from(raw.pitch_rate);
            delay.delay_ms(self.spacing_ms).await;
        }

        // A full-scale run overflows the f32 mantissa, so divide in f64.
        Ok(CalibrationBias::new(
            (sum as f64 / f64::from(self.samples)) as f32,
        ))
    }
}
