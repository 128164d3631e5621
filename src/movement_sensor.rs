//! Movement sensor contract.
//!
//! A movement sensor exposes up to six capabilities. Which of them a given
//! implementation supports is fixed by its hardware and reported through
//! [`MovementSensor::get_properties`]; getters for unsupported capabilities
//! fail with [`SensorError::CapabilityNotSupported`].

use crate::errors::{SensorError, SensorResult};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Three orthogonal components, as reported by the chip
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Geographic position in degrees
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Orientation vector: unit axis (o_x, o_y, o_z) plus rotation theta (degrees)
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Orientation {
    pub o_x: f64,
    pub o_y: f64,
    pub o_z: f64,
    pub theta: f64,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Position,
    LinearVelocity,
    AngularVelocity,
    LinearAcceleration,
    Orientation,
    CompassHeading,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::Position,
        Capability::LinearVelocity,
        Capability::AngularVelocity,
        Capability::LinearAcceleration,
        Capability::Orientation,
        Capability::CompassHeading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Position => "position",
            Capability::LinearVelocity => "linear_velocity",
            Capability::AngularVelocity => "angular_velocity",
            Capability::LinearAcceleration => "linear_acceleration",
            Capability::Orientation => "orientation",
            Capability::CompassHeading => "compass_heading",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported flag per capability
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    pub position_supported: bool,
    pub linear_velocity_supported: bool,
    pub angular_velocity_supported: bool,
    pub linear_acceleration_supported: bool,
    pub orientation_supported: bool,
    pub compass_heading_supported: bool,
}

impl Properties {
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Position => self.position_supported,
            Capability::LinearVelocity => self.linear_velocity_supported,
            Capability::AngularVelocity => self.angular_velocity_supported,
            Capability::LinearAcceleration => self.linear_acceleration_supported,
            Capability::Orientation => self.orientation_supported,
            Capability::CompassHeading => self.compass_heading_supported,
        }
    }

    pub fn supported(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(move |c| self.supports(*c))
    }
}

/// Error bound per supported capability
pub type Accuracy = BTreeMap<Capability, f64>;

/// One entry of [`MovementSensor::get_readings`]
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(untagged)]
pub enum ReadingValue {
    Position { point: GeoPoint, altitude: f64 },
    Vector(Vector3),
    Orientation(Orientation),
    Scalar(f64),
}

pub type Readings = BTreeMap<Capability, ReadingValue>;

pub fn not_supported(sensor: &str, capability: Capability) -> SensorError {
    SensorError::CapabilityNotSupported {
        sensor: sensor.to_string(),
        capability,
    }
}

#[async_trait]
pub trait MovementSensor: Send + Sync {
    fn name(&self) -> &str;

    /// Position and altitude (m)
    async fn get_position(&self) -> SensorResult<(GeoPoint, f64)>;
    async fn get_linear_velocity(&self) -> SensorResult<Vector3>;
    /// Angular velocity in deg/s
    async fn get_angular_velocity(&self) -> SensorResult<Vector3>;
    /// Linear acceleration in m/s^2
    async fn get_linear_acceleration(&self) -> SensorResult<Vector3>;
    /// Compass heading in radians, (-pi, pi]
    async fn get_compass_heading(&self) -> SensorResult<f64>;
    async fn get_orientation(&self) -> SensorResult<Orientation>;
    async fn get_properties(&self) -> Properties;
    async fn get_accuracy(&self) -> Accuracy;

    /// Every supported reading; fails as a whole on the first error
    async fn get_readings(&self) -> SensorResult<Readings> {
        let properties = self.get_properties().await;
        let mut readings = Readings::new();

        for capability in properties.supported() {
            let value = match capability {
                Capability::Position => {
                    let (point, altitude) = self.get_position().await?;
                    ReadingValue::Position { point, altitude }
                }
                Capability::LinearVelocity => ReadingValue::Vector(self.get_linear_velocity().await?),
                Capability::AngularVelocity => ReadingValue::Vector(self.get_angular_velocity().await?),
                Capability::LinearAcceleration => {
                    ReadingValue::Vector(self.get_linear_acceleration().await?)
                }
                Capability::Orientation => ReadingValue::Orientation(self.get_orientation().await?),
                Capability::CompassHeading => ReadingValue::Scalar(self.get_compass_heading().await?),
            };
            readings.insert(capability, value);
        }

        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_names() {
        let names: Vec<_> = Capability::ALL.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            names,
            [
                "position",
                "linear_velocity",
                "angular_velocity",
                "linear_acceleration",
                "orientation",
                "compass_heading"
            ]
        );
        assert_eq!(
            serde_json::to_string(&Capability::CompassHeading).unwrap(),
            "\"compass_heading\""
        );
    }

    #[test]
    fn test_supported_iterates_flags() {
        let props = Properties {
            angular_velocity_supported: true,
            compass_heading_supported: true,
            ..Default::default()
        };

        let supported: Vec<_> = props.supported().collect();
        assert_eq!(supported, [Capability::AngularVelocity, Capability::CompassHeading]);
        assert!(!props.supports(Capability::Position));
    }

    #[test]
    fn test_readings_serialize_by_capability_name() {
        let mut readings = Readings::new();
        readings.insert(Capability::CompassHeading, ReadingValue::Scalar(0.5));
        readings.insert(
            Capability::AngularVelocity,
            ReadingValue::Vector(Vector3::new(1.0, 2.0, 3.0)),
        );

        let json = serde_json::to_value(&readings).unwrap();
        assert_eq!(json["compass_heading"], 0.5);
        assert_eq!(json["angular_velocity"]["y"], 2.0);
    }
}
