//! Scripted hardware fakes for unit tests.

use std::collections::VecDeque;

use embedded_hal_async::delay::DelayNs;

use crate::port::{Actuator, InertialSensorPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

/// Answers burst reads from a queue. Once the queue is down to its last
/// entry that entry is repeated forever.
#[derive(Default)]
pub struct FakePort {
    pub bursts: VecDeque<Vec<u8>>,
    pub reads: Vec<(u8, usize)>,
    pub writes: Vec<(u8, u8)>,
    pub fail_next_reads: u32,
}

impl FakePort {
    pub fn with_bursts(bursts: &[&[u8]]) -> Self {
        Self {
            bursts: bursts.iter().map(|b| b.to_vec()).collect(),
            ..Default::default()
        }
    }
}

impl InertialSensorPort for FakePort {
    type Error = BusFault;

    async fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.writes.push((reg, value));
        Ok(())
    }

    async fn read_registers(&mut self, start: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.reads.push((start, buf.len()));
        if self.fail_next_reads > 0 {
            self.fail_next_reads -= 1;
            return Err(BusFault);
        }
        let burst = if self.bursts.len() > 1 {
            self.bursts.pop_front().ok_or(BusFault)?
        } else {
            self.bursts.front().cloned().ok_or(BusFault)?
        };
        buf.copy_from_slice(&burst[..buf.len()]);
        Ok(())
    }
}

#[derive(Default)]
pub struct NoDelay {
    pub calls: u32,
    pub total_ms: u32,
}

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.calls += 1;
        self.total_ms += ns / 1_000_000;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.calls += 1;
        self.total_ms += ms;
    }
}

#[derive(Default)]
pub struct FakeActuator {
    pub voltages: Vec<f32>,
    pub enabled: bool,
    pub toggles: Vec<bool>,
}

impl Actuator for FakeActuator {
    fn set_voltage(&mut self, volts: f32) {
        self.voltages.push(volts);
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.toggles.push(enabled);
    }
}
