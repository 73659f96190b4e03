use balance_core::Balancer;
use defmt::*;
use embassy_executor::task;
use embassy_time::{Delay, Duration, Instant, Ticker};
use portable_atomic::Ordering;

use crate::config::{LOOP_PERIOD_US, SENSOR_FAULT_LIMIT};
use crate::drivers::{HBridgeMotor, ImuBus};
use crate::ipc::{SYSTEM_CH, VERTICAL};

use super::{SystemAlert, SystemMessage};

pub type BalanceLoop = Balancer<ImuBus, HBridgeMotor>;

#[task]
pub async fn balance_task(mut balancer: BalanceLoop) {
    info!("Gyro calibration started - keep the robot still");
    let started = Instant::now();

    match balancer.calibrate(&mut Delay).await {
        Ok(bias) => info!(
            "Gyro calibration done in {}ms, bias {} counts",
            started.elapsed().as_millis(),
            bias.counts()
        ),
        Err(e) => {
            // A wrong bias would make the robot drift over; stay halted.
            error!("Gyro calibration failed: {:?}", e);
            SYSTEM_CH
                .try_send(SystemMessage::SystemAlert(SystemAlert::CalibrationFailed))
                .ok();
            return;
        }
    }

    info!("Balance loop started - {}us period", LOOP_PERIOD_US);
    let mut ticker = Ticker::every(Duration::from_micros(LOOP_PERIOD_US));
    let mut error_count = 0u32;

    loop {
        ticker.next().await;

        let consecutive_errors = balancer.consecutive_faults();
        match balancer.step().await {
            Ok(report) => {
                debug!(
                    "angle={} cmd={} gate={:?}",
                    report.angle, report.command, report.gate
                );

                if consecutive_errors > 0 {
                    info!(
                        "IMU recovered after {} consecutive errors",
                        consecutive_errors
                    );
                    if consecutive_errors >= SENSOR_FAULT_LIMIT {
                        SYSTEM_CH
                            .try_send(SystemMessage::SystemAlert(SystemAlert::ImuRecovered))
                            .ok();
                    }
                }

                let vertical = report.is_vertical();
                if VERTICAL.swap(vertical, Ordering::Release) != vertical {
                    info!(
                        "{} at {} deg",
                        if vertical { "Engaged" } else { "Disengaged" },
                        report.angle
                    );
                }

                SYSTEM_CH
                    .try_send(SystemMessage::Cycle {
                        timestamp: Instant::now(),
                        report,
                    })
                    .ok();
            }
            Err(e) => {
                error_count += 1;
                let consecutive_errors = balancer.consecutive_faults();

                if consecutive_errors % 100 == 1 {
                    warn!("IMU read error #{}: {:?}", error_count, e);
                }

                if consecutive_errors == SENSOR_FAULT_LIMIT {
                    error!(
                        "{} consecutive IMU errors - motor released",
                        consecutive_errors
                    );
                    VERTICAL.store(false, Ordering::Release);
                    SYSTEM_CH
                        .try_send(SystemMessage::SystemAlert(SystemAlert::ImuError))
                        .ok();
                }
            }
        }
    }
}
