use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex as RawMutex, channel::Channel};
use portable_atomic::AtomicBool;

use crate::config::SYSTEM_CHANNEL_SIZE;
use crate::tasks::SystemMessage;

/*  telemetry channel: balance task -> status task, dropped when full */
pub static SYSTEM_CH: Channel<RawMutex, SystemMessage, SYSTEM_CHANNEL_SIZE> = Channel::new();

/// Latest gate state, written once per cycle by the balance task.
pub static VERTICAL: AtomicBool = AtomicBool::new(false);
