use defmt::*;
use embassy_executor::task;
use embassy_stm32::gpio::Output;
use embassy_time::{Duration, Instant};
use portable_atomic::Ordering;

use crate::ipc::{SYSTEM_CH, VERTICAL};

use super::{SystemAlert, SystemMessage};

/// Mirrors the gate on the status LED and reports loop statistics.
#[task]
pub async fn status_task(mut led: Output<'static>) {
    info!("Status task started");
    let mut last_sec = Instant::now();
    let mut cycles = 0u32;
    let mut engaged = 0u32;
    let mut peak_command = 0.0f32;

    loop {
        match SYSTEM_CH.receive().await {
            SystemMessage::Cycle { timestamp, report } => {
                cycles += 1;
                if report.is_vertical() {
                    engaged += 1;
                }
                peak_command = peak_command.max(libm::fabsf(report.command));

                if VERTICAL.load(Ordering::Acquire) {
                    led.set_high();
                } else {
                    led.set_low();
                }

                // Report stats every second
                if timestamp.duration_since(last_sec) >= Duration::from_secs(1) {
                    let engaged_rate = (engaged * 100) / cycles.max(1);
                    info!(
                        "Balance: {} Hz, {}% engaged, angle {} deg, peak {} V",
                        cycles, engaged_rate, report.angle, peak_command
                    );
                    cycles = 0;
                    engaged = 0;
                    peak_command = 0.0;
                    last_sec = timestamp;
                }
            }
            SystemMessage::SystemAlert(alert) => {
                warn!("System alert: {:?}", alert);
                if alert != SystemAlert::ImuRecovered {
                    led.set_low();
                }
            }
        }
    }
}
