// Public modules
pub mod bus;
pub mod chip;
pub mod config;
pub mod errors;
pub mod movement_sensor;
pub mod registry;
pub mod sensors;

// Re-export commonly used types
pub use config::{load_bus_config, load_sensor_config, SensorConfig};
pub use errors::{SensorError, SensorResult};
pub use movement_sensor::{Capability, MovementSensor, Properties, Vector3};
pub use registry::init_all;

use movement_sensor::{Accuracy, Readings};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize tracing with default configuration
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}

/// Snapshot of one sensor, as printed by the binary
#[derive(Serialize, Debug)]
pub struct SensorReport {
    pub name: String,
    pub properties: Properties,
    pub accuracy: Accuracy,
    pub readings: Readings,
}

/// Read every supported capability once and log it
pub async fn report(sensor: &dyn MovementSensor) -> SensorResult<SensorReport> {
    let properties = sensor.get_properties().await;
    let readings = sensor.get_readings().await?;

    for (capability, value) in &readings {
        info!("[{}] {}: {:?}", sensor.name(), capability, value);
    }

    Ok(SensorReport {
        name: sensor.name().to_string(),
        properties,
        accuracy: sensor.get_accuracy().await,
        readings,
    })
}

/// Build every configured sensor and print one JSON report per sensor
pub async fn run_movement_sensor(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("[MovementSensor] starting up...");

    let bus_cfg = load_bus_config(&format!("{}/buses.toml", config_path))?;
    let sensor_config = load_sensor_config(&format!("{}/sensors.toml", config_path))?;
    info!("[config] loaded {} bus(es), {} sensor(s)", bus_cfg.buses.len(), sensor_config.sensors.len());

    let sensors = init_all(&bus_cfg, &sensor_config).await?;
    info!("[registry] sensors initialized");

    for sensor in &sensors {
        match report(sensor.as_ref()).await {
            Ok(r) => println!("{}", serde_json::to_string_pretty(&r)?),
            Err(e) => warn!("[{}] read failed: {}", sensor.name(), e),
        }
    }

    Ok(())
}
