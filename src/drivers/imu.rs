use balance_core::{Error, I2cPort, SampleLayout, SensorSampler};
use defmt::*;
use embassy_stm32::i2c;
use embassy_stm32::mode::Async;
use embassy_time::{Delay, Duration, Timer};

use crate::config::{IMU_ACCEL_RANGE, IMU_ADDRESS, IMU_GYRO_RANGE, IMU_INIT_ATTEMPTS};

pub type ImuBus = I2cPort<i2c::I2c<'static, Async>>;
pub type Imu = SensorSampler<ImuBus>;

/// Bring up an MPU-6050 on `i2c` and return an uncalibrated sampler.
pub async fn create_default_imu(
    i2c: i2c::I2c<'static, Async>,
) -> Result<Imu, Error<i2c::Error>> {
    let mut imu = SensorSampler::new(I2cPort::new(i2c, IMU_ADDRESS), SampleLayout::Mpu6050);

    info!("Starting MPU-6050 initialization sequence...");

    // Give the chip time to power up
    Timer::after(Duration::from_millis(100)).await;

    let mut last_error = Error::Transport(i2c::Error::Timeout);
    for attempt in 1..=IMU_INIT_ATTEMPTS {
        info!("MPU-6050 init attempt {}/{}", attempt, IMU_INIT_ATTEMPTS);

        match imu
            .configure(IMU_GYRO_RANGE, IMU_ACCEL_RANGE, &mut Delay)
            .await
        {
            Ok(()) => {
                info!(
                    "MPU-6050 initialized on attempt {} (gyro {:?}, accel {:?})",
                    attempt, IMU_GYRO_RANGE, IMU_ACCEL_RANGE
                );
                return Ok(imu);
            }
            Err(e) => {
                warn!("MPU-6050 init attempt {} failed: {:?}", attempt, e);
                last_error = e;

                // Progressive backoff: 200ms, 400ms, 800ms, 1600ms
                if attempt < IMU_INIT_ATTEMPTS {
                    let delay_ms = 200u64 << (attempt - 1);
                    info!("Waiting {}ms before next attempt...", delay_ms);
                    Timer::after(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    error!(
        "MPU-6050 initialization failed after {} attempts",
        IMU_INIT_ATTEMPTS
    );
    Err(last_error)
}
