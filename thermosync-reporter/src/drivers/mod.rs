use std::str::FromStr;

use thermosync_core::{ConfigError, FamilyDefaults};

pub mod ds18b20;
pub mod mcp9804;

pub use ds18b20::Ds18b20;
pub use mcp9804::{Mcp9804, Mcp9804Source};

/// Hardware family named by a sensor section's `Class` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Ds18b20,
    Mcp9804,
}

impl DeviceClass {
    pub fn family(&self) -> FamilyDefaults {
        match self {
            DeviceClass::Ds18b20 => ds18b20::FAMILY,
            DeviceClass::Mcp9804 => mcp9804::FAMILY,
        }
    }
}

impl FromStr for DeviceClass {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ds18b20" | "ds18b20sensor" => Ok(DeviceClass::Ds18b20),
            "mcp9804" | "mcp9804sensor" => Ok(DeviceClass::Mcp9804),
            _ => Err(ConfigError::UnsupportedClass(s.to_string())),
        }
    }
}

#[cfg(feature = "linux-i2c")]
pub fn open_linux_bus(bus: u32) -> anyhow::Result<linux_embedded_hal::I2cdev> {
    Ok(linux_embedded_hal::I2cdev::new(format!("/dev/i2c-{bus}"))?)
}
