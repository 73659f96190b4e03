//! # balance-core
//!
//! Sensor fusion and balance control for a two-wheeled inverted pendulum.
//!
//! The crate is `no_std`, does not allocate, and knows nothing about a
//! particular MCU. Hardware is reached through two small traits in [`port`]:
//! an I2C register port for the inertial sensor and an actuator that accepts a
//! voltage setpoint.
//!
//! | Module | Purpose |
//! | ------ | ------- |
//! | [`mpu6050`] | Register map and full-scale ranges of the inertial sensor |
//! | [`sampler`] | One-transaction sample reads with gyro bias compensation |
//! | [`calibration`] | Startup gyro bias estimation |
//! | [`estimator`] | Complementary filter producing the pitch angle |
//! | [`controller`] | PD law, output clamp and the tilt safety gate |
//! | [`pipeline`] | Per-cycle loop state and the [`Balancer`] that drives it |
//!
//! A typical bring-up is: configure the sensor, run [`Balancer::calibrate`]
//! once while the robot is held still, then call [`Balancer::step`] once per
//! loop period.

#![cfg_attr(not(test), no_std)]

pub mod calibration;
pub mod config;
pub mod controller;
pub mod error;
pub mod estimator;
pub mod mpu6050;
pub mod pipeline;
pub mod port;
pub mod sampler;

#[cfg(test)]
pub(crate) mod testing;

pub use calibration::GyroCalibrator;
pub use config::{
    BalanceConfig, CalibrationConfig, ControllerConfig, EstimatorConfig, SamplerConfig,
};
pub use controller::{BalanceController, ControlOutput, GateState};
pub use error::Error;
pub use estimator::TiltEstimator;
pub use mpu6050::{AccelRange, GyroRange};
pub use pipeline::{Balancer, ControlLoopState, CycleReport};
pub use port::{bridge_duty, Actuator, I2cPort, InertialSensorPort};
pub use sampler::{CalibrationBias, RawReading, RawSample, SampleLayout, SensorSampler};
