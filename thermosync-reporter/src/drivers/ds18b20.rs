use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thermosync_core::{AcquisitionError, Bounds, FamilyDefaults, SampleSource, SmoothingMode};

pub const W1_DEVICES_ROOT: &str = "/sys/bus/w1/devices";

/// 85 °C is the power-on reset value and signals a failed conversion.
pub const FAMILY: FamilyDefaults = FamilyDefaults {
    fault_bounds: Bounds::new(-40.0, 84.0),
    advanced_mode: SmoothingMode::Median,
    advanced_window: 7,
    preserve_destination: true,
};

/// DS18B20 on the kernel 1-wire bus, read through its `w1_slave` file.
pub struct Ds18b20 {
    path: PathBuf,
}

impl Ds18b20 {
    pub fn new(root: impl AsRef<Path>, address: &str) -> Self {
        Self {
            path: root.as_ref().join(address).join("w1_slave"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SampleSource for Ds18b20 {
    async fn acquire(&mut self) -> Result<f64, AcquisitionError> {
        let payload = tokio::fs::read_to_string(&self.path).await?;
        parse_w1_slave(&payload)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Decodes the two line `w1_slave` payload into degrees Celsius.
///
/// ```text
/// 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
/// 72 01 4b 46 7f ff 0e 10 57 t=23125
/// ```
pub fn parse_w1_slave(payload: &str) -> Result<f64, AcquisitionError> {
    let mut lines = payload.lines();

    let status = lines
        .next()
        .ok_or_else(|| AcquisitionError::Malformed("empty payload".to_string()))?;
    if status.trim_end().rsplit(' ').next() != Some("YES") {
        return Err(AcquisitionError::CrcMismatch);
    }

    let data = lines
        .next()
        .ok_or_else(|| AcquisitionError::Malformed("missing temperature line".to_string()))?;
    let (_, millis) = data
        .rsplit_once("t=")
        .ok_or_else(|| AcquisitionError::Malformed(data.to_string()))?;
    let millis: i64 = millis
        .trim()
        .parse()
        .map_err(|_| AcquisitionError::Malformed(data.to_string()))?;

    Ok(millis as f64 / 1000.0)
}
