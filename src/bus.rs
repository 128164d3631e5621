pub mod i2c;

use async_trait::async_trait;
use i2c::I2CError;

/// Register-level access to devices on a bus.
///
/// Every call is a single transaction against the device at `address`.
#[async_trait]
pub trait RegisterBus: Send {
    /// Device node or other identifier, for logging
    fn path(&self) -> &str;

    /// Read `buf.len()` consecutive registers starting at `reg`
    async fn read_registers(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> Result<(), I2CError>;

    async fn write_register(&mut self, address: u8, reg: u8, value: u8) -> Result<(), I2CError>;
}

/// Bus type enum for the communication interfaces a chip can sit on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusType {
    I2C,
}

impl BusType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i2c" => Some(BusType::I2C),
            _ => None,
        }
    }
}
