/// Errors raised by the sampling and control pipeline.
///
/// `E` is the bus error of the [`InertialSensorPort`](crate::port::InertialSensorPort)
/// in use.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// A register transaction with the sensor failed or timed out.
    #[error("sensor bus transaction failed")]
    Transport(E),
    /// A control cycle was requested before the gyro bias was measured.
    #[error("control cycle requested before gyro calibration")]
    CalibrationIncomplete,
    /// Calibration was requested again after the bias had been installed.
    #[error("gyro bias is already calibrated")]
    AlreadyCalibrated,
    /// The device answered with an unknown `WHO_AM_I` value.
    #[error("unexpected sensor id 0x{0:02x}")]
    UnexpectedDevice(u8),
}

impl<E> Error<E> {
    /// `true` for bus failures, which a later cycle may recover from.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
