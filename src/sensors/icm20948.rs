use super::{Model, SensorFactory};
use crate::bus::i2c::I2CBus;
use crate::chip::icm20948::Icm20948;
use crate::chip::ImuChip;
use crate::config::{AccuracyConfig, BusEntry, SensorEntry};
use crate::errors::{SensorError, SensorResult};
use crate::movement_sensor::{
    not_supported, Accuracy, Capability, GeoPoint, MovementSensor, Orientation, Properties, Vector3,
};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::trace;

/// Fixed for this chip: no GPS, no velocity integration, no fusion filter
const PROPERTIES: Properties = Properties {
    position_supported: false,
    linear_velocity_supported: false,
    angular_velocity_supported: true,
    linear_acceleration_supported: true,
    orientation_supported: false,
    compass_heading_supported: true,
};

/// Movement sensor backed by one ICM-20948-class chip.
///
/// The chip sits behind a mutex held for the whole of each read, so
/// concurrent queries never interleave bus transactions.
pub struct Icm20948Sensor<C> {
    name: String,
    chip: Mutex<C>,
    accuracy: AccuracyConfig,
}

impl<C: ImuChip> Icm20948Sensor<C> {
    pub fn new(name: String, chip: C, accuracy: AccuracyConfig) -> Self {
        Self {
            name,
            chip: Mutex::new(chip),
            accuracy,
        }
    }

    /// One combined transaction, split into (gyro, accel)
    async fn read_motion(&self) -> SensorResult<(Vector3, Vector3)> {
        let [gx, gy, gz, ax, ay, az] = self.chip.lock().await.read_accel_gyro().await?;
        Ok((Vector3::new(gx, gy, gz), Vector3::new(ax, ay, az)))
    }
}

/// Planar heading from the magnetometer x/y components, no tilt or declination correction
pub fn heading_from_field(mx: f64, my: f64) -> f64 {
    // -0.0 + 0.0 == +0.0, keeps a field along -x at +pi rather than -pi
    (my + 0.0).atan2(mx)
}

#[async_trait]
impl<C: ImuChip> MovementSensor for Icm20948Sensor<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_position(&self) -> SensorResult<(GeoPoint, f64)> {
        Err(not_supported(&self.name, Capability::Position))
    }

    async fn get_linear_velocity(&self) -> SensorResult<Vector3> {
        Err(not_supported(&self.name, Capability::LinearVelocity))
    }

    async fn get_angular_velocity(&self) -> SensorResult<Vector3> {
        let (gyro, _) = self.read_motion().await?;
        trace!("[{}] angular velocity {:?}", self.name, gyro);
        Ok(gyro)
    }

    async fn get_linear_acceleration(&self) -> SensorResult<Vector3> {
        let (_, accel) = self.read_motion().await?;
        trace!("[{}] linear acceleration {:?}", self.name, accel);
        Ok(accel)
    }

    async fn get_compass_heading(&self) -> SensorResult<f64> {
        let [mx, my, _mz] = self.chip.lock().await.read_magnetometer().await?;
        let heading = heading_from_field(mx, my);
        trace!("[{}] compass heading {:.4} rad", self.name, heading);
        Ok(heading)
    }

    async fn get_orientation(&self) -> SensorResult<Orientation> {
        Err(not_supported(&self.name, Capability::Orientation))
    }

    async fn get_properties(&self) -> Properties {
        PROPERTIES
    }

    async fn get_accuracy(&self) -> Accuracy {
        self.accuracy.to_accuracy(|c| PROPERTIES.supports(c))
    }
}

pub static ICM20948_FACTORY: Icm20948Factory = Icm20948Factory;

pub struct Icm20948Factory;

#[async_trait]
impl SensorFactory for Icm20948Factory {
    fn model(&self) -> Model {
        Model::new("ilboud", "movementsensor", "icm20948_sensor")
    }

    async fn create(&self, entry: &SensorEntry, bus: &BusEntry) -> SensorResult<Box<dyn MovementSensor>> {
        let handle = I2CBus::open(&bus.path).map_err(|e| {
            tracing::warn!("[{}] cannot open {}: {}", entry.name, bus.path, e);
            SensorError::BusNotFound { bus: bus.id.clone() }
        })?;

        let mut chip = Icm20948::new(
            entry.name.clone(),
            handle,
            entry.address,
            entry.accel_range_g,
            entry.gyro_range_dps,
        );
        chip.init().await?;

        Ok(Box::new(Icm20948Sensor::new(
            entry.name.clone(),
            chip,
            entry.accuracy.clone(),
        )))
    }
}
