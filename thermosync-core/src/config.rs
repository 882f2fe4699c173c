use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::params::Params;
use crate::validator::Bounds;

pub const DEFAULT_FORCED_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_ACQUISITION_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_PRECISION: u32 = 1;
/// Beyond this `f64` has no decimal digits left to round.
pub const MAX_PRECISION: u32 = 15;
/// Window used by the boolean `Smoothing` switch.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingMode {
    None,
    Mean,
    Median,
}

impl FromStr for SmoothingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "simple" => Ok(SmoothingMode::None),
            "mean" | "average" => Ok(SmoothingMode::Mean),
            "median" => Ok(SmoothingMode::Median),
            _ => Err(ConfigError::invalid("SmoothingMode", s)),
        }
    }
}

impl fmt::Display for SmoothingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmoothingMode::None => write!(f, "none"),
            SmoothingMode::Mean => write!(f, "mean"),
            SmoothingMode::Median => write!(f, "median"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn is_fahrenheit(&self) -> bool {
        matches!(self, TemperatureUnit::Fahrenheit)
    }
}

impl FromStr for TemperatureUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" | "c" => Ok(TemperatureUnit::Celsius),
            "F" | "f" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(ConfigError::UnsupportedUnit(s.to_string())),
        }
    }
}

/// Per-hardware settings that a sensor section cannot override.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FamilyDefaults {
    /// Raw readings outside this range are hardware faults, in Celsius.
    pub fault_bounds: Bounds,
    /// Smoothing selected by `Mode = Advanced`.
    pub advanced_mode: SmoothingMode,
    pub advanced_window: usize,
    /// Publish to the destination as configured, without the
    /// `/temperature` suffix, unless `PreserveDestination` says otherwise.
    pub preserve_destination: bool,
}

impl Default for FamilyDefaults {
    fn default() -> Self {
        Self {
            fault_bounds: Bounds::PLAUSIBLE_CELSIUS,
            advanced_mode: SmoothingMode::Mean,
            advanced_window: DEFAULT_SMOOTHING_WINDOW,
            preserve_destination: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorConfig {
    pub address: String,
    pub poll_interval: Duration,
    pub destination: String,
    pub precision: u32,
    pub unit: TemperatureUnit,
    pub smoothing: SmoothingMode,
    pub window_size: usize,
    pub forced_interval: Duration,
    pub acquisition_timeout: Duration,
    pub fault_bounds: Bounds,
    /// Celsius range the representative value must stay within.
    pub plausible_bounds: Bounds,
}

impl SensorConfig {
    pub fn new(address: impl Into<String>, poll_interval: Duration, destination: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            poll_interval,
            destination: destination.into(),
            precision: DEFAULT_PRECISION,
            unit: TemperatureUnit::Celsius,
            smoothing: SmoothingMode::None,
            window_size: 1,
            forced_interval: DEFAULT_FORCED_INTERVAL,
            acquisition_timeout: DEFAULT_ACQUISITION_TIMEOUT,
            fault_bounds: Bounds::PLAUSIBLE_CELSIUS,
            plausible_bounds: Bounds::PLAUSIBLE_CELSIUS,
        }
    }

    pub fn with_smoothing(mut self, mode: SmoothingMode, window_size: usize) -> Self {
        self.smoothing = mode;
        self.window_size = window_size;
        self
    }

    pub fn with_unit(mut self, unit: TemperatureUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_forced_interval(mut self, forced_interval: Duration) -> Self {
        self.forced_interval = forced_interval;
        self
    }

    pub fn with_fault_bounds(mut self, fault_bounds: Bounds) -> Self {
        self.fault_bounds = fault_bounds;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::NonPositivePoll(0.0));
        }

        if self.smoothing != SmoothingMode::None && self.window_size < 1 {
            return Err(ConfigError::EmptyWindow);
        }

        if self.acquisition_timeout.is_zero() {
            return Err(ConfigError::invalid("Timeout", "0"));
        }

        if self.precision > MAX_PRECISION {
            return Err(ConfigError::invalid("PrecisionTemp", &self.precision.to_string()));
        }

        Ok(())
    }

    /// Builds a sensor configuration from its section parameters.
    ///
    /// `Address`, `Poll` and `Destination`/`TempDest` are required; every
    /// other parameter falls back to a default. Smoothing is resolved in
    /// order of precedence: `SmoothingMode`/`WindowSize`, then the boolean
    /// `Smoothing` switch, then `Mode = Advanced` which picks the family's
    /// preferred filter.
    pub fn from_params(params: &Params, family: &FamilyDefaults) -> Result<Self, ConfigError> {
        let address = params.require("Address")?.to_string();

        let poll = params
            .parse::<f64>("Poll")?
            .ok_or_else(|| ConfigError::MissingParameter("Poll".to_string()))?;
        if !poll.is_finite() || poll <= 0.0 {
            return Err(ConfigError::NonPositivePoll(poll));
        }
        let poll_interval = secs_duration(params, "Poll", poll)?;

        let mut destination = params.require_any(&["Destination", "TempDest"])?.to_string();
        let preserve = params
            .parse_bool("PreserveDestination")?
            .unwrap_or(family.preserve_destination);
        if !preserve {
            destination.push_str("/temperature");
        }

        let unit = match params.first_of(&["Scale", "TempUnit"]) {
            Some(raw) => raw.parse()?,
            None => TemperatureUnit::Celsius,
        };

        let precision = params.parse::<u32>("PrecisionTemp")?.unwrap_or(DEFAULT_PRECISION);

        let (smoothing, default_window) = match params.get("SmoothingMode") {
            Some(raw) => (raw.parse::<SmoothingMode>()?, family.advanced_window),
            None if params.parse_bool("Smoothing")?.unwrap_or(false) => {
                (SmoothingMode::Mean, DEFAULT_SMOOTHING_WINDOW)
            }
            None => match params.get("Mode") {
                Some(mode) if mode.eq_ignore_ascii_case("advanced") => {
                    (family.advanced_mode, family.advanced_window)
                }
                _ => (SmoothingMode::None, 1),
            },
        };
        let window_size = params.parse::<usize>("WindowSize")?.unwrap_or(default_window);

        let forced_interval = secs_param(params, "ForcePublishInterval")?.unwrap_or(DEFAULT_FORCED_INTERVAL);
        let acquisition_timeout = secs_param(params, "Timeout")?.unwrap_or(DEFAULT_ACQUISITION_TIMEOUT);

        let config = Self {
            address,
            poll_interval,
            destination,
            precision,
            unit,
            smoothing,
            window_size,
            forced_interval,
            acquisition_timeout,
            fault_bounds: family.fault_bounds,
            plausible_bounds: Bounds::PLAUSIBLE_CELSIUS,
        };
        config.validate()?;

        Ok(config)
    }
}

fn secs_param(params: &Params, name: &str) -> Result<Option<Duration>, ConfigError> {
    match params.parse::<f64>(name)? {
        Some(secs) => secs_duration(params, name, secs).map(Some),
        None => Ok(None),
    }
}

/// Rejects negative, non-finite and out of range seconds.
fn secs_duration(params: &Params, name: &str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| ConfigError::invalid(name, params.get(name).unwrap_or_default()))
}
