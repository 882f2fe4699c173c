use crate::convert;

/// Returns true when `raw` is present and inside `[min, max]`.
pub fn validate(raw: Option<f64>, min: f64, max: f64) -> bool {
    match raw {
        Some(value) => value >= min && value <= max,
        None => false,
    }
}

/// Inclusive acceptance range for a reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    /// Range a physical temperature sensor can plausibly report, in Celsius.
    pub const PLAUSIBLE_CELSIUS: Bounds = Bounds::new(-40.0, 125.0);

    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn accepts(&self, raw: Option<f64>) -> bool {
        validate(raw, self.min, self.max)
    }

    /// Expresses Celsius bounds in the published unit.
    pub fn converted(&self, to_fahrenheit: bool) -> Self {
        Self {
            min: convert::convert(self.min, to_fahrenheit),
            max: convert::convert(self.max, to_fahrenheit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_is_rejected() {
        assert!(!validate(None, -40.0, 125.0));
        assert!(!Bounds::PLAUSIBLE_CELSIUS.accepts(None));
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let bounds = Bounds::PLAUSIBLE_CELSIUS;

        assert!(bounds.accepts(Some(-40.0)));
        assert!(bounds.accepts(Some(125.0)));
        assert!(!bounds.accepts(Some(-41.0)));
        assert!(!bounds.accepts(Some(126.0)));
    }

    #[test]
    fn test_nan_is_rejected() {
        assert!(!validate(Some(f64::NAN), -40.0, 125.0));
    }

    #[test]
    fn test_fault_value_rejected() {
        // 85 °C is what a DS18B20 reports before its first conversion
        let fault = Bounds::new(-40.0, 84.0);
        assert!(!fault.accepts(Some(85.0)));
        assert!(fault.accepts(Some(84.0)));
    }

    #[test]
    fn test_converted_bounds() {
        let fahrenheit = Bounds::PLAUSIBLE_CELSIUS.converted(true);
        assert_eq!(fahrenheit, Bounds::new(-40.0, 257.0));
        assert_eq!(Bounds::PLAUSIBLE_CELSIUS.converted(false), Bounds::PLAUSIBLE_CELSIUS);
    }
}
