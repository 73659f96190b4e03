//! Hardware seams: the inertial sensor register port and the motor actuator.

use embedded_hal_async::i2c::I2c;

/// Byte-level register access to the inertial sensor.
#[allow(async_fn_in_trait)]
pub trait InertialSensorPort {
    type Error: core::fmt::Debug;

    async fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error>;

    /// Burst-read `buf.len()` consecutive registers starting at `start`.
    async fn read_registers(&mut self, start: u8, buf: &mut [u8]) -> Result<(), Self::Error>;
}

/// Voltage-controlled motor output.
pub trait Actuator {
    /// Command a terminal voltage. Callers keep `volts` inside the supply range.
    fn set_voltage(&mut self, volts: f32);

    /// Energize or release the motor driver.
    fn set_enabled(&mut self, enabled: bool);
}

/// Split a voltage command into `(in1, in2)` duty values for an IN/IN
/// H-bridge whose full duty is `max_duty`.
///
/// Positive voltage drives IN1, negative drives IN2. Magnitudes above the
/// supply clamp to full duty; NaN and a non-positive supply give `(0, 0)`.
pub fn bridge_duty(volts: f32, supply_voltage: f32, max_duty: u16) -> (u16, u16) {
    let ratio = libm::fabsf(volts) / supply_voltage;
    if ratio.is_nan() || ratio <= 0.0 || supply_voltage <= 0.0 {
        return (0, 0);
    }
    let duty = (ratio.min(1.0) * max_duty as f32) as u16;
    if volts >= 0.0 {
        (duty, 0)
    } else {
        (0, duty)
    }
}

/// [`InertialSensorPort`] over any async I2C bus.
pub struct I2cPort<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C: I2c> I2cPort<I2C> {
    pub fn new(i2c: I2C, addr: u8) -> Self {
        Self { i2c, addr }
    }

    pub fn address(&self) -> u8 {
        self.addr
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> InertialSensorPort for I2cPort<I2C> {
    type Error = I2C::Error;

    async fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.addr, &[reg, value]).await
    }

    async fn read_registers(&mut self, start: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(self.addr, &[start], buf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_duty_sign_selects_leg() {
        assert_eq!(bridge_duty(6.0, 12.0, 1000), (500, 0));
        assert_eq!(bridge_duty(-3.0, 12.0, 1000), (0, 250));
        assert_eq!(bridge_duty(0.0, 12.0, 1000), (0, 0));
        assert_eq!(bridge_duty(-0.0, 12.0, 1000), (0, 0));
    }

    #[test]
    fn test_bridge_duty_clamps_at_supply() {
        assert_eq!(bridge_duty(12.0, 12.0, 1000), (1000, 0));
        assert_eq!(bridge_duty(40.0, 12.0, 1000), (1000, 0));
        assert_eq!(bridge_duty(-40.0, 12.0, u16::MAX), (0, u16::MAX));
        assert_eq!(bridge_duty(f32::INFINITY, 12.0, 1000), (1000, 0));
    }

    #[test]
    fn test_bridge_duty_rejects_nan_and_bad_supply() {
        assert_eq!(bridge_duty(f32::NAN, 12.0, 1000), (0, 0));
        assert_eq!(bridge_duty(6.0, 0.0, 1000), (0, 0));
        assert_eq!(bridge_duty(6.0, -12.0, 1000), (0, 0));
        assert_eq!(bridge_duty(6.0, f32::NAN, 1000), (0, 0));
    }
    use embassy_futures::block_on;
    use embedded_hal_async::i2c::{ErrorKind, ErrorType, Operation};

    #[derive(Default)]
    struct RecordingBus {
        writes: Vec<(u8, Vec<u8>)>,
        reply: Vec<u8>,
    }

    impl ErrorType for RecordingBus {
        type Error = ErrorKind;
    }

    impl I2c for RecordingBus {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            for op in operations {
                match op {
                    Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                    Operation::Read(buf) => buf.copy_from_slice(&self.reply[..buf.len()]),
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_write_register_sends_address_then_value() {
        let mut port = I2cPort::new(RecordingBus::default(), 0x68);
        block_on(port.write_register(0x6B, 0x00)).unwrap();
        let bus = port.release();
        assert_eq!(bus.writes, vec![(0x68, vec![0x6B, 0x00])]);
    }

    #[test]
    fn test_read_registers_points_then_reads() {
        let bus = RecordingBus {
            reply: vec![1, 2, 3, 4, 5, 6],
            ..Default::default()
        };
        let mut port = I2cPort::new(bus, 0x69);
        let mut buf = [0u8; 6];
        block_on(port.read_registers(0x3D, &mut buf)).unwrap();
        assert_eq!(buf, [1, 2, 3, 4, 5, 6]);
        assert_eq!(port.release().writes, vec![(0x69, vec![0x3D])]);
    }
}
