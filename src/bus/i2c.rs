use super::RegisterBus;
use async_trait::async_trait;
#[cfg(target_os = "linux")]
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};
#[cfg(target_os = "linux")]
use i2cdev::core::I2CDevice;

/// I2C bus error type - platform specific
#[cfg(target_os = "linux")]
pub type I2CError = LinuxI2CError;

#[cfg(not(target_os = "linux"))]
#[derive(Debug)]
pub struct I2CError(String);

#[cfg(not(target_os = "linux"))]
impl std::fmt::Display for I2CError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "I2C not supported on this platform: {}", self.0)
    }
}

#[cfg(not(target_os = "linux"))]
impl std::error::Error for I2CError {}

#[cfg(not(target_os = "linux"))]
impl From<std::io::Error> for I2CError {
    fn from(e: std::io::Error) -> Self {
        I2CError(e.to_string())
    }
}

/// Handle on one i2c-dev character device.
///
/// A single handle can address several devices on the bus (the ICM-20948 and
/// its bypassed AK09916 magnetometer); the slave address is set per
/// transaction.
#[cfg(target_os = "linux")]
pub struct I2CBus {
    device: LinuxI2CDevice,
    path: String,
    current_address: Option<u8>,
}

#[cfg(not(target_os = "linux"))]
pub struct I2CBus {
    path: String,
}

#[cfg(target_os = "linux")]
impl I2CBus {
    pub fn open(path: &str) -> Result<Self, I2CError> {
        let device = LinuxI2CDevice::new(path, 0)?;
        Ok(Self {
            device,
            path: path.to_string(),
            current_address: None,
        })
    }

    fn select(&mut self, address: u8) -> Result<(), I2CError> {
        if self.current_address != Some(address) {
            self.device.set_slave_address(address as u16)?;
            self.current_address = Some(address);
        }
        Ok(())
    }
}

#[cfg(target_os = "linux")]
#[async_trait]
impl RegisterBus for I2CBus {
    fn path(&self) -> &str {
        &self.path
    }

    async fn read_registers(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> Result<(), I2CError> {
        self.select(address)?;

        if buf.len() == 1 {
            buf[0] = self.device.smbus_read_byte_data(reg)?;
        } else {
            let data = self.device.smbus_read_i2c_block_data(reg, buf.len() as u8)?;
            if data.len() != buf.len() {
                return Err(LinuxI2CError::from(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("short block read: wanted {} bytes, got {}", buf.len(), data.len()),
                )));
            }
            buf.copy_from_slice(&data);
        }

        tracing::trace!("[{}] read {} byte(s) from {:#04x}/{:#04x}", self.path, buf.len(), address, reg);
        Ok(())
    }

    async fn write_register(&mut self, address: u8, reg: u8, value: u8) -> Result<(), I2CError> {
        self.select(address)?;
        self.device.smbus_write_byte_data(reg, value)?;
        tracing::trace!("[{}] wrote {:#04x} to {:#04x}/{:#04x}", self.path, value, address, reg);
        Ok(())
    }
}

#[cfg(not(target_os = "linux"))]
impl I2CBus {
    pub fn open(path: &str) -> Result<Self, I2CError> {
        Err(I2CError(format!("cannot open '{}': I2C is only supported on Linux", path)))
    }
}

#[cfg(not(target_os = "linux"))]
#[async_trait]
impl RegisterBus for I2CBus {
    fn path(&self) -> &str {
        &self.path
    }

    async fn read_registers(&mut self, _address: u8, _reg: u8, _buf: &mut [u8]) -> Result<(), I2CError> {
        Err(I2CError("I2C is only supported on Linux".to_string()))
    }

    async fn write_register(&mut self, _address: u8, _reg: u8, _value: u8) -> Result<(), I2CError> {
        Err(I2CError("I2C is only supported on Linux".to_string()))
    }
}
