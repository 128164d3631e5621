use crate::config::{BusEntry, SensorEntry};
use crate::errors::{SensorError, SensorResult};
use crate::movement_sensor::MovementSensor;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "icm20948")]
pub mod icm20948;

/// Sensor model identifier, written `namespace:family:name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Model {
    pub namespace: String,
    pub family: String,
    pub name: String,
}

impl Model {
    pub fn new(namespace: &str, family: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            family: family.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.family, self.name)
    }
}

impl FromStr for Model {
    type Err = SensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [namespace, family, name] if parts.iter().all(|p| !p.trim().is_empty()) => {
                Ok(Model::new(namespace.trim(), family.trim(), name.trim()))
            }
            _ => Err(SensorError::UnsupportedModel { model: s.to_string() }),
        }
    }
}

/// Builds a ready-to-use movement sensor for one model
#[async_trait]
pub trait SensorFactory: Sync {
    fn model(&self) -> Model;
    async fn create(&self, entry: &SensorEntry, bus: &BusEntry) -> SensorResult<Box<dyn MovementSensor>>;
}

#[cfg(feature = "icm20948")]
pub use self::icm20948::ICM20948_FACTORY;

pub static SENSOR_FACTORIES: &[&dyn SensorFactory] = &[
    #[cfg(feature = "icm20948")]
    &ICM20948_FACTORY,
];

pub fn find_factory(model: &Model) -> SensorResult<&'static dyn SensorFactory> {
    SENSOR_FACTORIES
        .iter()
        .copied()
        .find(|f| f.model() == *model)
        .ok_or_else(|| SensorError::UnsupportedModel { model: model.to_string() })
}

pub async fn create_movement_sensor(entry: &SensorEntry, bus: &BusEntry) -> SensorResult<Box<dyn MovementSensor>> {
    let model: Model = entry.model.parse()?;
    find_factory(&model)?.create(entry, bus).await
}
