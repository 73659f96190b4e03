//! MPU-6050 register map and full-scale range encodings.

/// Default 7-bit I2C address (AD0 low).
pub const ADDRESS: u8 = 0x68;
/// Address with AD0 pulled high.
pub const ADDRESS_ALT: u8 = 0x69;

/// Expected contents of [`reg::WHO_AM_I`].
pub const WHO_AM_I_VALUE: u8 = 0x68;

// Register addresses
pub mod reg {
    pub const GYRO_CONFIG: u8 = 0x1B;
    pub const ACCEL_CONFIG: u8 = 0x1C;
    pub const ACCEL_YOUT_H: u8 = 0x3D;
    pub const ACCEL_ZOUT_H: u8 = 0x3F;
    pub const TEMP_OUT_H: u8 = 0x41;
    pub const GYRO_XOUT_H: u8 = 0x43;
    pub const PWR_MGMT_1: u8 = 0x6B;
    pub const WHO_AM_I: u8 = 0x75;
}

/// `PWR_MGMT_1` value that clears SLEEP and selects the internal oscillator.
pub const PWR_MGMT_1_WAKE: u8 = 0x00;

/// Gyroscope full-scale range (`GYRO_CONFIG.FS_SEL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroRange {
    #[default]
    Dps250,
    Dps500,
    Dps1000,
    Dps2000,
}

impl GyroRange {
    /// Value to write into `GYRO_CONFIG`.
    pub const fn register_value(self) -> u8 {
        let fs_sel = match self {
            Self::Dps250 => 0,
            Self::Dps500 => 1,
            Self::Dps1000 => 2,
            Self::Dps2000 => 3,
        };
        fs_sel << 3
    }

    /// Counts per degree per second.
    pub const fn lsb_per_dps(self) -> f32 {
        match self {
            Self::Dps250 => 131.0,
            Self::Dps500 => 65.5,
            Self::Dps1000 => 32.8,
            Self::Dps2000 => 16.4,
        }
    }
}

/// Accelerometer full-scale range (`ACCEL_CONFIG.AFS_SEL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelRange {
    #[default]
    G2,
    G4,
    G8,
    G16,
}

impl AccelRange {
    /// Value to write into `ACCEL_CONFIG`.
    pub const fn register_value(self) -> u8 {
        let afs_sel = match self {
            Self::G2 => 0,
            Self::G4 => 1,
            Self::G8 => 2,
            Self::G16 => 3,
        };
        afs_sel << 3
    }

    /// Counts per g.
    pub const fn lsb_per_g(self) -> f32 {
        match self {
            Self::G2 => 16384.0,
            Self::G4 => 8192.0,
            Self::G8 => 4096.0,
            Self::G16 => 2048.0,
        }
    }
}
