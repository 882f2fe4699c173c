use async_trait::async_trait;

use crate::errors::AcquisitionError;

/// Hardware access for one sensor: acquires a single raw reading in Celsius.
#[async_trait]
pub trait SampleSource: Send {
    async fn acquire(&mut self) -> Result<f64, AcquisitionError>;

    /// Human readable location of the device, for logs.
    fn describe(&self) -> String;
}
