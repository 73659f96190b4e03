use embassy_stm32::gpio::{Level, Output, OutputType, Speed};
use embassy_stm32::mode::Async;
use embassy_stm32::peripherals::TIM3;
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::{bind_interrupts, i2c, peripherals, rcc, Config};

use crate::config::{I2C_FREQUENCY_HZ, MOTOR_PWM_HZ};

// ── IRQ table ─────────────────────────────────────────────
bind_interrupts!(pub struct Irqs {
    I2C2   => i2c::EventInterruptHandler<peripherals::I2C2>,
              i2c::ErrorInterruptHandler<peripherals::I2C2>;
});

// ── Board struct ──────────────────────────────────────────
pub struct Board {
    pub i2c: i2c::I2c<'static, Async>, // DMA
    pub motor_pwm: SimplePwm<'static, TIM3>,
    pub motor_enable: Output<'static>,
    pub status_led: Output<'static>,
}

impl Board {
    pub fn init() -> Self {
        let mut config = Config::default();

        // HSI16 through the PLL for a 64MHz sysclk
        config.rcc.hsi = true; // HSISYS undivided (DIV1)
        config.rcc.pll = Some(rcc::Pll {
            source: rcc::PllSource::HSI,    // Use HSI as PLL source
            prediv: rcc::PllPreDiv::DIV2,   // 16MHz / 2 = 8MHz
            mul: rcc::PllMul::MUL16,        // 8MHz * 16 = 128MHz
            divp: None,                     // Not used
            divq: None,                     // Not used
            divr: Some(rcc::PllRDiv::DIV2), // 128MHz / 2 = 64MHz
        });
        config.rcc.sys = rcc::Sysclk::PLL1_R;
        let p = embassy_stm32::init(config);

        // LD4 on the Nucleo board, lit while balancing
        let status_led = Output::new(p.PA5, Level::Low, Speed::Low);

        // Driver nSLEEP, held low until calibration is done
        let motor_enable = Output::new(p.PB0, Level::Low, Speed::Low);

        // I²C2 to the MPU-6050 (DMA CH7 TX, CH6 RX)
        let mut i2c_cfg = i2c::Config::default();
        i2c_cfg.sda_pullup = false;
        i2c_cfg.scl_pullup = false;

        let i2c = i2c::I2c::new(
            p.I2C2,
            p.PB10,
            p.PB11,
            Irqs,
            p.DMA1_CH7,
            p.DMA1_CH6,
            Hertz(I2C_FREQUENCY_HZ),
            i2c_cfg,
        );

        // TIM3 CH1/CH2 drive the H-bridge IN1/IN2 inputs
        let in1 = PwmPin::new_ch1(p.PA6, OutputType::PushPull);
        let in2 = PwmPin::new_ch2(p.PA7, OutputType::PushPull);
        let motor_pwm = SimplePwm::new(
            p.TIM3,
            Some(in1),
            Some(in2),
            None,
            None,
            Hertz(MOTOR_PWM_HZ),
            CountingMode::EdgeAlignedUp,
        );

        Self {
            i2c,
            motor_pwm,
            motor_enable,
            status_led,
        }
    }
}
