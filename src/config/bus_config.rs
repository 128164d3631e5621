use crate::bus::BusType;
use crate::errors::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::fs;

/// Root structure for loading `[[bus]]` style TOML config
#[derive(Debug, Deserialize)]
pub struct BusConfig {
    #[serde(rename = "bus")]
    pub buses: Vec<BusEntry>,
}

/// One bus entry (e.g. an i2c-dev character device)
#[derive(Debug, Clone, Deserialize)]
pub struct BusEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub r#type: String, // 'type' is a reserved word in Rust, use raw identifier
    pub path: String,
}

impl BusConfig {
    pub fn find(&self, id: &str) -> Option<&BusEntry> {
        self.buses.iter().find(|b| b.id == id)
    }

    fn validate(&self) -> ConfigResult<()> {
        for b in &self.buses {
            if BusType::from_str(&b.r#type).is_none() {
                return Err(ConfigError::InvalidValue {
                    field: format!("bus.{}.type", b.id),
                    reason: format!("unknown bus type '{}'", b.r#type),
                });
            }
        }
        Ok(())
    }
}

pub fn parse_bus_config(content: &str) -> ConfigResult<BusConfig> {
    let parsed: BusConfig = toml::from_str(content)?;
    parsed.validate()?;
    Ok(parsed)
}

/// Load bus config file
pub fn load_bus_config(path: &str) -> ConfigResult<BusConfig> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadError {
        path: path.to_string(),
        source: e,
    })?;
    parse_bus_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_buses() {
        let cfg = parse_bus_config(
            r#"
            [[bus]]
            id = "i2c1"
            type = "i2c"
            path = "/dev/i2c-1"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.buses.len(), 1);
        assert_eq!(cfg.find("i2c1").unwrap().path, "/dev/i2c-1");
        assert!(cfg.find("i2c0").is_none());
    }

    #[test]
    fn test_unknown_bus_type_rejected() {
        let err = parse_bus_config(
            r#"
            [[bus]]
            id = "spi0"
            type = "spi"
            path = "/dev/spidev0.0"
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
