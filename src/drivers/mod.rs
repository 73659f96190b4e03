pub mod imu;
pub mod motor;

pub use imu::{create_default_imu, Imu, ImuBus};
pub use motor::HBridgeMotor;
