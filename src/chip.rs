use crate::errors::SensorResult;
use async_trait::async_trait;
use serde::Deserialize;

#[cfg(feature = "icm20948")]
pub mod icm20948;

/// Raw read operations of an IMU chip.
///
/// Each call is one bus transaction. Implementations do not retry.
#[async_trait]
pub trait ImuChip: Send {
    /// Gyroscope (deg/s) and accelerometer (m/s^2) from a single transaction,
    /// ordered `[gx, gy, gz, ax, ay, az]`
    async fn read_accel_gyro(&mut self) -> SensorResult<[f64; 6]>;

    /// Magnetic field `[mx, my, mz]` in microtesla
    async fn read_magnetometer(&mut self) -> SensorResult<[f64; 3]>;
}

/// Accelerometer full-scale range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u16")]
pub enum AccelRange {
    #[default]
    G2,
    G4,
    G8,
    G16,
}

impl AccelRange {
    /// Sensitivity in LSB/g
    pub fn lsb_per_g(&self) -> f64 {
        match self {
            AccelRange::G2 => 16384.0,
            AccelRange::G4 => 8192.0,
            AccelRange::G8 => 4096.0,
            AccelRange::G16 => 2048.0,
        }
    }

    /// ACCEL_FS_SEL field value
    pub fn fs_sel(&self) -> u8 {
        match self {
            AccelRange::G2 => 0,
            AccelRange::G4 => 1,
            AccelRange::G8 => 2,
            AccelRange::G16 => 3,
        }
    }
}

impl TryFrom<u16> for AccelRange {
    type Error = String;

    fn try_from(g: u16) -> Result<Self, Self::Error> {
        match g {
            2 => Ok(AccelRange::G2),
            4 => Ok(AccelRange::G4),
            8 => Ok(AccelRange::G8),
            16 => Ok(AccelRange::G16),
            other => Err(format!("accelerometer range must be 2, 4, 8 or 16 g, got {}", other)),
        }
    }
}

/// Gyroscope full-scale range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u16")]
pub enum GyroRange {
    #[default]
    Dps250,
    Dps500,
    Dps1000,
    Dps2000,
}

impl GyroRange {
    /// Sensitivity in LSB/(deg/s)
    pub fn lsb_per_dps(&self) -> f64 {
        match self {
            GyroRange::Dps250 => 131.0,
            GyroRange::Dps500 => 65.5,
            GyroRange::Dps1000 => 32.8,
            GyroRange::Dps2000 => 16.4,
        }
    }

    /// GYRO_FS_SEL field value
    pub fn fs_sel(&self) -> u8 {
        match self {
            GyroRange::Dps250 => 0,
            GyroRange::Dps500 => 1,
            GyroRange::Dps1000 => 2,
            GyroRange::Dps2000 => 3,
        }
    }
}

impl TryFrom<u16> for GyroRange {
    type Error = String;

    fn try_from(dps: u16) -> Result<Self, Self::Error> {
        match dps {
            250 => Ok(GyroRange::Dps250),
            500 => Ok(GyroRange::Dps500),
            1000 => Ok(GyroRange::Dps1000),
            2000 => Ok(GyroRange::Dps2000),
            other => Err(format!("gyroscope range must be 250, 500, 1000 or 2000 dps, got {}", other)),
        }
    }
}
