//! Reading, validation, smoothing and change publication for polled
//! temperature sensors.
//!
//! A [`Sensor`] pulls one raw reading per tick from a [`SampleSource`],
//! rejects hardware faults, converts and rounds the value, feeds it through a
//! [`SmoothingWindow`] and hands the representative value to a
//! [`ChangePublisher`], which fans it out to every [`PublishSink`] when it
//! changed or a heartbeat is due.

pub mod config;
pub mod convert;
pub mod errors;
pub mod params;
pub mod publisher;
pub mod sensor;
pub mod source;
pub mod validator;
pub mod window;

pub use config::{FamilyDefaults, SensorConfig, SmoothingMode, TemperatureUnit};
pub use errors::{AcquisitionError, ConfigError, PublishError};
pub use params::Params;
pub use publisher::{ChangePublisher, PublishSink, SensorState};
pub use sensor::{Device, Sensor, TickOutcome};
pub use source::SampleSource;
pub use validator::{Bounds, validate};
pub use window::SmoothingWindow;
