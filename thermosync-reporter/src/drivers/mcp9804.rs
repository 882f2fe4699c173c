use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use embedded_hal::i2c::{Error as _, I2c};
use thermosync_core::{AcquisitionError, Bounds, FamilyDefaults, SampleSource, SmoothingMode};

pub const FAMILY: FamilyDefaults = FamilyDefaults {
    fault_bounds: Bounds::new(-40.0, 125.0),
    advanced_mode: SmoothingMode::Mean,
    advanced_window: 5,
    preserve_destination: false,
};

/// Time the sensor needs for one conversion after leaving shutdown.
pub const CONVERSION_TIME: Duration = Duration::from_millis(360);

const REG_CONFIG: u8 = 0x01;
const REG_AMBIENT: u8 = 0x05;

const CONFIG_CONTINUOUS: u16 = 0x0000;
const CONFIG_SHUTDOWN: u16 = 0x0001;

/// Decoded ambient temperature register.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientReading {
    pub celsius: f64,
    pub critical: bool,
    pub upper: bool,
    pub lower: bool,
}

impl AmbientReading {
    pub fn decode(msb: u8, lsb: u8) -> Self {
        let mut celsius = f64::from(msb & 0x0f) * 16.0 + f64::from(lsb) / 16.0;
        if msb >> 4 & 1 == 1 {
            celsius = 256.0 - celsius;
        }

        Self {
            celsius,
            critical: msb >> 7 & 1 == 1,
            upper: msb >> 6 & 1 == 1,
            lower: msb >> 5 & 1 == 1,
        }
    }
}

/// Blocking MCP9804 driver over any `embedded-hal` I2C bus.
pub struct Mcp9804<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Mcp9804<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn wake(&mut self) -> Result<(), I2C::Error> {
        self.write_config(CONFIG_CONTINUOUS)
    }

    pub fn shutdown(&mut self) -> Result<(), I2C::Error> {
        self.write_config(CONFIG_SHUTDOWN)
    }

    pub fn read_ambient(&mut self) -> Result<AmbientReading, I2C::Error> {
        let mut buffer = [0u8; 2];
        self.i2c.write_read(self.address, &[REG_AMBIENT], &mut buffer)?;

        Ok(AmbientReading::decode(buffer[0], buffer[1]))
    }

    // SMBus word writes go out low byte first
    fn write_config(&mut self, word: u16) -> Result<(), I2C::Error> {
        let [low, high] = word.to_le_bytes();
        self.i2c.write(self.address, &[REG_CONFIG, low, high])
    }
}

/// Async sample source that wakes the sensor, waits for a conversion, reads
/// it and puts it back into shutdown.
pub struct Mcp9804Source<I2C> {
    device: Arc<Mutex<Mcp9804<I2C>>>,
    label: String,
    conversion_time: Duration,
}

impl<I2C> Mcp9804Source<I2C>
where
    I2C: I2c + Send + 'static,
{
    pub fn new(device: Mcp9804<I2C>, label: impl Into<String>) -> Self {
        Self {
            device: Arc::new(Mutex::new(device)),
            label: label.into(),
            conversion_time: CONVERSION_TIME,
        }
    }

    pub fn with_conversion_time(mut self, conversion_time: Duration) -> Self {
        self.conversion_time = conversion_time;
        self
    }

    async fn blocking<T, F>(&self, operation: F) -> Result<T, AcquisitionError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Mcp9804<I2C>) -> Result<T, AcquisitionError> + Send + 'static,
    {
        let device = Arc::clone(&self.device);

        tokio::task::spawn_blocking(move || {
            let mut device = device
                .lock()
                .map_err(|_| AcquisitionError::Bus("device lock poisoned".to_string()))?;
            operation(&mut device)
        })
        .await
        .map_err(|e| AcquisitionError::Bus(e.to_string()))?
    }
}

fn bus_error<E: embedded_hal::i2c::Error>(error: E) -> AcquisitionError {
    AcquisitionError::Bus(format!("{:?}", error.kind()))
}

#[async_trait]
impl<I2C> SampleSource for Mcp9804Source<I2C>
where
    I2C: I2c + Send + 'static,
{
    async fn acquire(&mut self) -> Result<f64, AcquisitionError> {
        if let Err(e) = self.blocking(|device| device.wake().map_err(bus_error)).await {
            tracing::warn!("Wakeup of {} failed: {}", self.label, e);
        }

        tokio::time::sleep(self.conversion_time).await;

        let reading = self
            .blocking(|device| {
                let reading = device.read_ambient().map_err(bus_error);
                if let Err(e) = device.shutdown() {
                    tracing::warn!("Shutdown failed: {:?}", e.kind());
                }
                reading
            })
            .await?;

        if reading.critical || reading.upper || reading.lower {
            tracing::debug!(
                "Alert flags on {}: critical={} upper={} lower={}",
                self.label,
                reading.critical,
                reading.upper,
                reading.lower
            );
        }

        Ok(reading.celsius)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// Parses an I2C address written in hex, with or without a `0x` prefix.
pub fn parse_address(raw: &str) -> Option<u8> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);

    u8::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
pub(crate) mod mock {
    use std::sync::{Arc, Mutex};

    use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

    /// Records every write and answers reads with a fixed register value.
    #[derive(Debug, Clone, Default)]
    pub struct MockBus {
        pub ambient: [u8; 2],
        pub fail_reads: bool,
        pub writes: Arc<Mutex<Vec<(u8, Vec<u8>)>>>,
    }

    impl ErrorType for MockBus {
        type Error = ErrorKind;
    }

    impl I2c for MockBus {
        fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
            for operation in operations {
                match operation {
                    Operation::Write(bytes) => {
                        self.writes.lock().unwrap().push((address, bytes.to_vec()));
                    }
                    Operation::Read(buffer) => {
                        if self.fail_reads {
                            return Err(ErrorKind::Bus);
                        }
                        buffer.copy_from_slice(&self.ambient[..buffer.len()]);
                    }
                }
            }

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockBus;
    use super::*;

    #[test]
    fn test_decode_positive() {
        let reading = AmbientReading::decode(0x01, 0x94);

        assert_eq!(reading.celsius, 25.25);
        assert!(!reading.critical && !reading.upper && !reading.lower);
    }

    #[test]
    fn test_decode_alert_flags() {
        let reading = AmbientReading::decode(0xE1, 0x90);

        assert_eq!(reading.celsius, 25.0);
        assert!(reading.critical);
        assert!(reading.upper);
        assert!(reading.lower);
    }

    #[test]
    fn test_decode_sign_bit() {
        // magnitude 255.0, sign bit set
        let reading = AmbientReading::decode(0x1F, 0xF0);
        assert_eq!(reading.celsius, 1.0);

        // magnitude 250.5
        let reading = AmbientReading::decode(0x1F, 0xA8);
        assert_eq!(reading.celsius, 5.5);
    }

    #[test]
    fn test_config_words_are_low_byte_first() {
        let bus = MockBus::default();
        let mut device = Mcp9804::new(bus.clone(), 0x1f);

        device.wake().unwrap();
        device.shutdown().unwrap();

        assert_eq!(
            *bus.writes.lock().unwrap(),
            vec![(0x1f, vec![0x01, 0x00, 0x00]), (0x1f, vec![0x01, 0x01, 0x00])]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_wakes_reads_and_shuts_down() {
        let bus = MockBus {
            ambient: [0x01, 0x90],
            ..Default::default()
        };
        let mut source = Mcp9804Source::new(Mcp9804::new(bus.clone(), 0x1f), "i2c-1@0x1f");

        assert_eq!(source.acquire().await.unwrap(), 25.0);
        assert_eq!(
            *bus.writes.lock().unwrap(),
            vec![
                (0x1f, vec![0x01, 0x00, 0x00]),
                (0x1f, vec![0x05]),
                (0x1f, vec![0x01, 0x01, 0x00]),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_read_still_shuts_down() {
        let bus = MockBus {
            fail_reads: true,
            ..Default::default()
        };
        let mut source = Mcp9804Source::new(Mcp9804::new(bus.clone(), 0x18), "i2c-1@0x18")
            .with_conversion_time(Duration::from_millis(10));

        assert!(matches!(source.acquire().await, Err(AcquisitionError::Bus(_))));
        assert_eq!(
            bus.writes.lock().unwrap().last(),
            Some(&(0x18, vec![0x01, 0x01, 0x00]))
        );
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x1f"), Some(0x1f));
        assert_eq!(parse_address("18"), Some(0x18));
        assert_eq!(parse_address("0xzz"), None);
    }
}
