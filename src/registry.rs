use crate::config::{BusConfig, SensorConfig};
use crate::errors::{ConfigError, RegistryError, RegistryResult, SensorError};
use crate::movement_sensor::MovementSensor;
use crate::sensors::create_movement_sensor;
use tracing::info;

/// Construct every configured sensor; each one opens its own bus handle
pub async fn init_all(bus_cfg: &BusConfig, sensor_config: &SensorConfig) -> RegistryResult<Vec<Box<dyn MovementSensor>>> {
    let mut sensors: Vec<Box<dyn MovementSensor>> = Vec::new();
    info!("[registry] initializing {} sensor(s)...", sensor_config.sensors.len());

    for s in sensor_config.sensors.iter() {
        let bus = bus_cfg.find(&s.bus).ok_or_else(|| ConfigError::InvalidValue {
            field: format!("sensor.{}.bus", s.name),
            reason: format!("no bus with id '{}'", s.bus),
        })?;

        info!("[registry] registering sensor: name={} model={} bus={}", s.name, s.model, bus.path);
        let sensor = create_movement_sensor(s, bus)
            .await
            .map_err(|e: SensorError| RegistryError::DriverCreationError {
                name: s.name.clone(),
                source: e,
            })?;
        sensors.push(sensor);
    }

    Ok(sensors)
}
