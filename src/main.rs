#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use {defmt_rtt as _, panic_probe as _};

use balance_core::Balancer;
use balance_embassy::{
    config::{balance_config, SUPPLY_VOLTAGE},
    drivers::{create_default_imu, HBridgeMotor},
    tasks::{balance_task, status_task},
    Board,
};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting balance firmware");
    let board = Board::init();

    // Driver stays asleep at 0 V until the gyro is calibrated
    let motor = HBridgeMotor::new(board.motor_pwm, board.motor_enable, SUPPLY_VOLTAGE);

    spawner.spawn(status_task(board.status_led)).unwrap();
    info!("Status task spawned");

    match create_default_imu(board.i2c).await {
        Ok(imu) => {
            let balancer = Balancer::new(imu, motor, &balance_config());
            spawner.spawn(balance_task(balancer)).unwrap();
            info!("Balance task spawned");
        }
        Err(e) => error!("IMU initialization failed: {:?}", e),
    }

    core::future::pending::<()>().await;
}
