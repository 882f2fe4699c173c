use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::{env, fmt, fs};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thermosync_core::Params;
use tracing::Level;

#[derive(Debug, Clone, Deserialize)]
pub struct Logger {
    pub level: String,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Any scalar a section value may be written as; everything is handed to
/// the sensors as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(value) => write!(f, "{value}"),
            Scalar::Integer(value) => write!(f, "{value}"),
            Scalar::Float(value) => write!(f, "{value}"),
            Scalar::Text(value) => f.write_str(value),
        }
    }
}

pub type Section = HashMap<String, Scalar>;

pub fn section_params(section: &Section) -> Params {
    section
        .iter()
        .map(|(key, value)| (key.as_str(), value.to_string()))
        .collect()
}

/// `Name` of a section, or `<kind>-<index>` when it has none.
pub fn section_name(params: &Params, kind: &str, index: usize) -> String {
    params
        .get("Name")
        .map(str::to_string)
        .unwrap_or_else(|| format!("{kind}-{index}"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub logger: Logger,
    #[serde(default)]
    pub connections: Vec<Section>,
    #[serde(default)]
    pub sensors: Vec<Section>,
}

impl Settings {
    /// Layers `configs/default`, `configs/<RUN_MODE>` and `THERMOSYNC__*`
    /// environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("THERMOSYNC").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Reads exactly one TOML file, as given on the command line.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Message(format!("{}: {}", path.display(), e)))?;

        content
            .parse()
            .map_err(|e: toml::de::Error| ConfigError::Message(e.to_string()))
    }

    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::new(),
        }
    }

    /// Filter directives for sensors with their own `Level`, scoped to that
    /// sensor's poll ticks. Sections with an unknown level are left out.
    pub fn sensor_log_directives(&self) -> Vec<String> {
        self.sensors
            .iter()
            .enumerate()
            .filter_map(|(index, section)| {
                let params = section_params(section);
                let level = params.get("Level")?.parse::<Level>().ok()?;
                let name = section_name(&params, "sensor", index);

                Some(format!(
                    "thermosync_core[tick{{sensor={name}}}]={}",
                    level.as_str().to_ascii_lowercase()
                ))
            })
            .collect()
    }
}

impl FromStr for Settings {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}
