use balance_core::CycleReport;
use defmt::Format;
use embassy_time::Instant;

pub mod balance;
pub mod status;

pub use balance::{balance_task, BalanceLoop};
pub use status::status_task;

#[derive(Debug, Format, Clone)]
pub enum SystemMessage {
    Cycle { timestamp: Instant, report: CycleReport },
    SystemAlert(SystemAlert),
}

#[derive(Debug, Format, Clone, Copy, PartialEq, Eq)]
pub enum SystemAlert {
    CalibrationFailed,
    ImuError,
    ImuRecovered,
}
