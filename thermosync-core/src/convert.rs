pub fn convert(value: f64, to_fahrenheit: bool) -> f64 {
    if to_fahrenheit {
        value * 9.0 / 5.0 + 32.0
    } else {
        value
    }
}

/// Rounds half away from zero to `precision` decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Text form of a value as it is sent to sinks.
pub fn format_value(value: f64, precision: u32) -> String {
    format!("{:.*}", precision as usize, round_to(value, precision))
}
