// Centralize all configuration constants
use balance_core::{AccelRange, BalanceConfig, GyroRange, SampleLayout};

pub const LOOP_PERIOD_US: u64 = 8_000;
pub const LOOP_PERIOD_S: f32 = LOOP_PERIOD_US as f32 / 1_000_000.0;

pub const I2C_FREQUENCY_HZ: u32 = 400_000;
pub const IMU_ADDRESS: u8 = balance_core::mpu6050::ADDRESS;
pub const IMU_INIT_ATTEMPTS: u32 = 5;
pub const IMU_GYRO_RANGE: GyroRange = GyroRange::Dps250;
pub const IMU_ACCEL_RANGE: AccelRange = AccelRange::G2;

pub const SUPPLY_VOLTAGE: f32 = 12.0;
pub const MOTOR_PWM_HZ: u32 = 20_000;

// Consecutive failed IMU reads before the motor is released
pub const SENSOR_FAULT_LIMIT: u32 = 50;

// Channel sizes
pub const SYSTEM_CHANNEL_SIZE: usize = 32;

pub fn balance_config() -> BalanceConfig {
    let mut config = BalanceConfig::default()
        .with_layout(SampleLayout::Mpu6050)
        .with_loop_period(LOOP_PERIOD_S)
        .with_fault_limit(SENSOR_FAULT_LIMIT);
    config.sampler.gyro_range = IMU_GYRO_RANGE;
    config.sampler.accel_range = IMU_ACCEL_RANGE;
    config
}
