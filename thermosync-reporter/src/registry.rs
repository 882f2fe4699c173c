use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use thermosync_core::{ConfigError, Device, Params, PublishSink, Sensor, SensorConfig};

use crate::drivers::ds18b20::W1_DEVICES_ROOT;
use crate::drivers::{DeviceClass, Ds18b20};
use crate::settings::{Settings, section_name, section_params};
use crate::sinks::{GraphiteSink, LogSink};

pub type Sinks = HashMap<String, Arc<dyn PublishSink>>;

/// Builds one sink per `[[connections]]` section.
///
/// A broken section is logged and skipped so the rest still come up.
pub fn build_sinks(settings: &Settings) -> Sinks {
    let mut sinks = Sinks::new();

    for (index, section) in settings.connections.iter().enumerate() {
        let params = section_params(section);
        let name = section_name(&params, "connection", index);

        match build_sink(&name, &params) {
            Ok(sink) => {
                tracing::info!("Created connection {}", name);
                sinks.insert(name, sink);
            }
            Err(e) => tracing::error!("Error creating connection {}: {}", name, e),
        }
    }

    tracing::debug!("{} connections created", sinks.len());
    sinks
}

pub fn build_sink(name: &str, params: &Params) -> Result<Arc<dyn PublishSink>, ConfigError> {
    let class = params.require("Class")?;

    match class.to_ascii_lowercase().as_str() {
        "graphite" | "graphiteconnection" => Ok(Arc::new(GraphiteSink::from_params(name, params)?)),
        "log" | "local" => Ok(Arc::new(LogSink::new(name))),
        _ => Err(ConfigError::UnsupportedClass(class.to_string())),
    }
}

/// Builds every `[[sensors]]` section. Each sensor reads and publishes once
/// while it is being created.
pub async fn build_devices(settings: &Settings, sinks: &Sinks) -> Vec<Box<dyn Device>> {
    let mut devices: Vec<Box<dyn Device>> = Vec::new();

    for (index, section) in settings.sensors.iter().enumerate() {
        let params = section_params(section);
        let name = section_name(&params, "sensor", index);

        tracing::info!("Creating device for {}", name);
        match build_sensor(&name, &params, sinks).await {
            Ok(sensor) => devices.push(Box::new(sensor)),
            Err(e) => tracing::error!("Error creating device {}: {:#}", name, e),
        }
    }

    tracing::debug!("{} sensors created", devices.len());
    devices
}

pub async fn build_sensor(name: &str, params: &Params, sinks: &Sinks) -> anyhow::Result<Sensor> {
    let class: DeviceClass = params.require("Class")?.parse()?;
    let config = SensorConfig::from_params(params, &class.family())?;
    let sensor_sinks = select_sinks(params, sinks)?;

    match class {
        DeviceClass::Ds18b20 => {
            let root = params
                .get("DeviceRoot")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(W1_DEVICES_ROOT));
            let source = Ds18b20::new(root, &config.address);

            Ok(Sensor::new(name, config, source, sensor_sinks).await?)
        }
        DeviceClass::Mcp9804 => build_mcp9804(name, params, config, sensor_sinks).await,
    }
}

#[cfg(feature = "linux-i2c")]
async fn build_mcp9804(
    name: &str,
    params: &Params,
    config: SensorConfig,
    sinks: Vec<Arc<dyn PublishSink>>,
) -> anyhow::Result<Sensor> {
    use crate::drivers::mcp9804::parse_address;
    use crate::drivers::{Mcp9804, Mcp9804Source, open_linux_bus};

    let address = parse_address(&config.address)
        .ok_or_else(|| ConfigError::invalid("Address", &config.address))?;
    let bus = params
        .parse::<u32>("Bus")?
        .ok_or_else(|| ConfigError::MissingParameter("Bus".to_string()))?;

    let i2c = open_linux_bus(bus).with_context(|| format!("Failed to open I2C bus {bus}"))?;
    let source = Mcp9804Source::new(Mcp9804::new(i2c, address), format!("i2c-{bus}@{address:#04x}"));

    Ok(Sensor::new(name, config, source, sinks).await?)
}

#[cfg(not(feature = "linux-i2c"))]
async fn build_mcp9804(
    _name: &str,
    _params: &Params,
    _config: SensorConfig,
    _sinks: Vec<Arc<dyn PublishSink>>,
) -> anyhow::Result<Sensor> {
    Err(ConfigError::UnsupportedClass("mcp9804".to_string()))
        .context("I2C support requires the `linux-i2c` feature")
}

/// Resolves the comma separated `Connection` parameter, in listed order.
pub fn select_sinks(params: &Params, sinks: &Sinks) -> Result<Vec<Arc<dyn PublishSink>>, ConfigError> {
    params
        .list("Connection")
        .into_iter()
        .map(|name| {
            sinks
                .get(&name)
                .cloned()
                .ok_or(ConfigError::UnknownConnection(name))
        })
        .collect()
}
