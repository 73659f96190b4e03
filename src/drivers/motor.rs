//! Brushed motor behind a two-input H-bridge (IN/IN mode) with an nSLEEP
//! enable line.
//!
//! Positive voltage drives IN1, negative drives IN2. The duty ratio is the
//! commanded voltage over the supply voltage.

use balance_core::{bridge_duty, Actuator};
use defmt::*;
use embassy_stm32::gpio::Output;
use embassy_stm32::peripherals::TIM3;
use embassy_stm32::timer::simple_pwm::SimplePwm;

pub struct HBridgeMotor {
    pwm: SimplePwm<'static, TIM3>,
    enable: Output<'static>,
    supply_voltage: f32,
}

impl HBridgeMotor {
    /// Takes over the PWM timer with both legs at 0% and the driver asleep.
    pub fn new(
        mut pwm: SimplePwm<'static, TIM3>,
        enable: Output<'static>,
        supply_voltage: f32,
    ) -> Self {
        pwm.ch1().set_duty_cycle_fully_off();
        pwm.ch2().set_duty_cycle_fully_off();
        pwm.ch1().enable();
        pwm.ch2().enable();

        let mut motor = Self {
            pwm,
            enable,
            supply_voltage,
        };
        motor.set_enabled(false);
        info!(
            "H-bridge ready: supply {} V, max duty {}",
            supply_voltage,
            motor.pwm.max_duty_cycle()
        );
        motor
    }
}

impl Actuator for HBridgeMotor {
    fn set_voltage(&mut self, volts: f32) {
        let (in1, in2) = bridge_duty(volts, self.supply_voltage, self.pwm.max_duty_cycle());
        // Drop the idle leg first so both never conduct together.
        if in1 > 0 {
            self.pwm.ch2().set_duty_cycle(0);
            self.pwm.ch1().set_duty_cycle(in1);
        } else {
            self.pwm.ch1().set_duty_cycle(0);
            self.pwm.ch2().set_duty_cycle(in2);
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.enable.set_high();
        } else {
            self.enable.set_low();
        }
        debug!("motor driver {}", if enabled { "awake" } else { "asleep" });
    }
}
