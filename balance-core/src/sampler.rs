//! One-transaction inertial sample reads.
//!
//! Each call to [`SensorSampler::sample`] performs exactly one burst read so
//! that the acceleration and rate words come from the same sensor update.

use embedded_hal_async::delay::DelayNs;

use crate::error::Error;
use crate::mpu6050::{self, reg, AccelRange, GyroRange};
use crate::port::InertialSensorPort;

/// Longest burst any layout needs.
const MAX_BURST: usize = 8;

/// Settling time after writing the range registers.
const CONFIGURE_SETTLE_MS: u32 = 100;

/// Shape of the burst read starting at the lateral acceleration high byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleLayout {
    /// Six bytes: lateral accel, vertical accel, pitch rate.
    #[default]
    Contiguous,
    /// Eight bytes on the MPU-6050: `ACCEL_YOUT`, `ACCEL_ZOUT`, `TEMP_OUT`,
    /// `GYRO_XOUT`. The temperature word is skipped.
    Mpu6050,
}

impl SampleLayout {
    pub const fn burst_len(self) -> usize {
        match self {
            Self::Contiguous => 6,
            Self::Mpu6050 => 8,
        }
    }

    const fn rate_offset(self) -> usize {
        match self {
            Self::Contiguous => 4,
            Self::Mpu6050 => 6,
        }
    }

    fn decode(self, buf: &[u8]) -> RawReading {
        let word = |at: usize| i16::from_be_bytes([buf[at], buf[at + 1]]);
        RawReading {
            lateral_accel: word(0),
            vertical_accel: word(2),
            pitch_rate: word(self.rate_offset()),
        }
    }
}

/// Register words exactly as read, before bias compensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawReading {
    pub lateral_accel: i16,
    pub vertical_accel: i16,
    pub pitch_rate: i16,
}

/// One control-cycle sample with the gyro bias removed from the rate.
///
/// Acceleration is in accelerometer counts, the rate in gyro counts. The rate
/// is kept as `f32` so a fractional bias is not truncated away.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub lateral_accel: i16,
    pub vertical_accel: i16,
    pub pitch_rate: f32,
}

impl RawSample {
    pub fn new(lateral_accel: i16, vertical_accel: i16, pitch_rate: f32) -> Self {
        Self {
            lateral_accel,
            vertical_accel,
            pitch_rate,
        }
    }
}

/// Zero-rate offset of the pitch gyro, in gyro counts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationBias(f32);

impl CalibrationBias {
    pub const ZERO: Self = Self(0.0);

    pub const fn new(counts: f32) -> Self {
        Self(counts)
    }

    pub const fn counts(self) -> f32 {
        self.0
    }

    pub fn compensate(self, raw_rate: i16) -> f32 {
        raw_rate as f32 - self.0
    }
}

/// Reads samples from the inertial sensor and applies the gyro bias.
pub struct SensorSampler<P> {
    port: P,
    layout: SampleLayout,
    bias: Option<CalibrationBias>,
}

impl<P: InertialSensorPort> SensorSampler<P> {
    /// Sampler without a bias. Reads are uncompensated until a calibration
    /// run installs one.
    pub fn new(port: P, layout: SampleLayout) -> Self {
        Self {
            port,
            layout,
            bias: None,
        }
    }

    /// Sampler with a bias measured earlier.
    pub fn with_bias(port: P, layout: SampleLayout, bias: CalibrationBias) -> Self {
        Self {
            port,
            layout,
            bias: Some(bias),
        }
    }

    /// Check the device id, wake it and program the full-scale ranges.
    pub async fn configure<D: DelayNs>(
        &mut self,
        gyro_range: GyroRange,
        accel_range: AccelRange,
        delay: &mut D,
    ) -> Result<(), Error<P::Error>> {
        let mut id = [0u8; 1];
        self.port
            .read_registers(reg::WHO_AM_I, &mut id)
            .await
            .map_err(Error::Transport)?;
        if id[0] != mpu6050::WHO_AM_I_VALUE {
            return Err(Error::UnexpectedDevice(id[0]));
        }

        self.write(reg::PWR_MGMT_1, mpu6050::PWR_MGMT_1_WAKE).await?;
        self.write(reg::ACCEL_CONFIG, accel_range.register_value())
            .await?;
        self.write(reg::GYRO_CONFIG, gyro_range.register_value())
            .await?;
        delay.delay_ms(CONFIGURE_SETTLE_MS).await;
        Ok(())
    }

    /// One burst read, no bias applied.
    pub async fn read_raw(&mut self) -> Result<RawReading, Error<P::Error>> {
        let mut buf = [0u8; MAX_BURST];
        let burst = &mut buf[..self.layout.burst_len()];
        self.port
            .read_registers(reg::ACCEL_YOUT_H, burst)
            .await
            .map_err(Error::Transport)?;
        Ok(self.layout.decode(burst))
    }

    /// One burst read with the current bias subtracted from the pitch rate.
    pub async fn sample(&mut self) -> Result<RawSample, Error<P::Error>> {
        let raw = self.read_raw().await?;
        let bias = self.bias.unwrap_or(CalibrationBias::ZERO);
        Ok(RawSample {
            lateral_accel: raw.lateral_accel,
            vertical_accel: raw.vertical_accel,
            pitch_rate: bias.compensate(raw.pitch_rate),
        })
    }

    pub(crate) fn set_bias(&mut self, bias: CalibrationBias) {
        self.bias = Some(bias);
    }

    pub fn bias(&self) -> Option<CalibrationBias> {
        self.bias
    }

    pub fn is_calibrated(&self) -> bool {
        self.bias.is_some()
    }

    pub fn layout(&self) -> SampleLayout {
        self.layout
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    async fn write(&mut self, reg: u8, value: u8) -> Result<(), Error<P::Error>> {
        self.port
            .write_register(reg, value)
            .await
            .map_err(Error::Transport)
    }
}
