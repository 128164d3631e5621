use crate::chip::{AccelRange, GyroRange};
use crate::errors::{ConfigError, ConfigResult};
use crate::movement_sensor::{Accuracy, Capability};
use serde::Deserialize;
use std::fs;

/// Root configuration struct expecting `[[sensor]]` TOML array format
#[derive(Debug, Deserialize)]
pub struct SensorConfig {
    #[serde(rename = "sensor")]
    pub sensors: Vec<SensorEntry>,
}

/// One sensor entry, matching each `[[sensor]]` section
#[derive(Debug, Clone, Deserialize)]
pub struct SensorEntry {
    pub name: String,
    /// Model triple, e.g. `ilboud:movementsensor:icm20948_sensor`
    pub model: String,
    /// Bus id from `buses.toml`
    pub bus: String,
    #[serde(default = "default_address")]
    pub address: u8,
    #[serde(default)]
    pub accel_range_g: AccelRange,
    #[serde(default)]
    pub gyro_range_dps: GyroRange,
    #[serde(default)]
    pub accuracy: AccuracyConfig,
}

fn default_address() -> u8 {
    0x68
}

/// Error bounds reported by `get_accuracy`.
///
/// The defaults are placeholders, not calibration results.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AccuracyConfig {
    pub angular_velocity: f64,
    pub linear_acceleration: f64,
    pub compass_heading: f64,
}

impl Default for AccuracyConfig {
    fn default() -> Self {
        Self {
            angular_velocity: 0.1,
            linear_acceleration: 0.05,
            compass_heading: 2.0,
        }
    }
}

impl AccuracyConfig {
    fn entries(&self) -> [(Capability, f64); 3] {
        [
            (Capability::AngularVelocity, self.angular_velocity),
            (Capability::LinearAcceleration, self.linear_acceleration),
            (Capability::CompassHeading, self.compass_heading),
        ]
    }

    /// Accuracy map restricted to the given capabilities
    pub fn to_accuracy(&self, supported: impl Fn(Capability) -> bool) -> Accuracy {
        self.entries()
            .into_iter()
            .filter(|(cap, _)| supported(*cap))
            .collect()
    }

    fn validate(&self, sensor: &str) -> ConfigResult<()> {
        for (cap, value) in self.entries() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("sensor.{}.accuracy.{}", sensor, cap),
                    reason: format!("must be a finite non-negative number, got {}", value),
                });
            }
        }
        Ok(())
    }
}

impl SensorConfig {
    fn validate(&self) -> ConfigResult<()> {
        for (i, s) in self.sensors.iter().enumerate() {
            if self.sensors[..i].iter().any(|other| other.name == s.name) {
                return Err(ConfigError::InvalidValue {
                    field: format!("sensor.{}.name", s.name),
                    reason: "duplicate sensor name".to_string(),
                });
            }
            s.accuracy.validate(&s.name)?;
        }
        Ok(())
    }
}

pub fn parse_sensor_config(content: &str) -> ConfigResult<SensorConfig> {
    let parsed: SensorConfig = toml::from_str(content)?;
    parsed.validate()?;
    Ok(parsed)
}

/// Loads config from TOML file
pub fn load_sensor_config(path: &str) -> ConfigResult<SensorConfig> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadError {
        path: path.to_string(),
        source: e,
    })?;
    parse_sensor_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [[sensor]]
        name = "imu0"
        model = "ilboud:movementsensor:icm20948_sensor"
        bus = "i2c1"
    "#;

    #[test]
    fn test_defaults_applied() {
        let cfg = parse_sensor_config(MINIMAL).unwrap();
        let s = &cfg.sensors[0];

        assert_eq!(s.address, 0x68);
        assert_eq!(s.accel_range_g, AccelRange::G2);
        assert_eq!(s.gyro_range_dps, GyroRange::Dps250);
        assert_eq!(s.accuracy, AccuracyConfig::default());
    }

    #[test]
    fn test_overrides() {
        let cfg = parse_sensor_config(
            r#"
            [[sensor]]
            name = "imu0"
            model = "ilboud:movementsensor:icm20948_sensor"
            bus = "i2c1"
            address = 0x69
            accel_range_g = 8
            gyro_range_dps = 1000

            [sensor.accuracy]
            compass_heading = 0.5
            "#,
        )
        .unwrap();
        let s = &cfg.sensors[0];

        assert_eq!(s.address, 0x69);
        assert_eq!(s.accel_range_g, AccelRange::G8);
        assert_eq!(s.gyro_range_dps, GyroRange::Dps1000);
        assert_eq!(s.accuracy.compass_heading, 0.5);
        assert_eq!(s.accuracy.angular_velocity, 0.1);
    }

    #[test]
    fn test_negative_accuracy_rejected() {
        let err = parse_sensor_config(
            r#"
            [[sensor]]
            name = "imu0"
            model = "ilboud:movementsensor:icm20948_sensor"
            bus = "i2c1"

            [sensor.accuracy]
            linear_acceleration = -1.0
            "#,
        )
        .unwrap_err();

        match err {
            ConfigError::InvalidValue { field, .. } => {
                assert_eq!(field, "sensor.imu0.accuracy.linear_acceleration");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_range_rejected() {
        let err = parse_sensor_config(
            r#"
            [[sensor]]
            name = "imu0"
            model = "ilboud:movementsensor:icm20948_sensor"
            bus = "i2c1"
            accel_range_g = 3
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::FormatError(_)));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let doubled = format!("{}\n{}", MINIMAL, MINIMAL);
        assert!(parse_sensor_config(&doubled).is_err());
    }

    #[test]
    fn test_accuracy_filtered_by_support() {
        let acc = AccuracyConfig::default().to_accuracy(|c| c != Capability::CompassHeading);

        assert_eq!(acc.len(), 2);
        assert_eq!(acc.get(&Capability::AngularVelocity), Some(&0.1));
        assert!(!acc.contains_key(&Capability::CompassHeading));
    }
}
