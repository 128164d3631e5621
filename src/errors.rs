use thiserror::Error;
use crate::bus::i2c::I2CError;
use crate::movement_sensor::Capability;

/// Error types for movement sensors and their chip drivers
#[derive(Error, Debug)]
pub enum SensorError {
    /// Bus failure, passed through from the chip transaction unchanged
    #[error("I2C communication failed: {0}")]
    I2c(#[from] I2CError),

    #[error("Sensor '{sensor}' does not support {capability}")]
    CapabilityNotSupported { sensor: String, capability: Capability },

    #[error("Sensor '{sensor}' initialization failed: {reason}")]
    InitError { sensor: String, reason: String },

    #[error("Sensor '{sensor}' returned invalid data: {reason}")]
    DataError { sensor: String, reason: String },

    #[error("Sensor '{sensor}' wrong chip ID: expected {expected:#04x}, got {actual:#04x}")]
    WrongChipId { sensor: String, expected: u8, actual: u8 },

    #[error("Unsupported sensor model: '{model}'")]
    UnsupportedModel { model: String },

    #[error("Bus '{bus}' not found or unavailable")]
    BusNotFound { bus: String },
}

impl SensorError {
    pub fn is_not_supported(&self) -> bool {
        matches!(self, SensorError::CapabilityNotSupported { .. })
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from '{path}': {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration format: {0}")]
    FormatError(#[from] toml::de::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Registry and construction errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create sensor '{name}': {source}")]
    DriverCreationError {
        name: String,
        #[source]
        source: SensorError,
    },
}

pub type SensorResult<T> = Result<T, SensorError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type RegistryResult<T> = Result<T, RegistryError>;
