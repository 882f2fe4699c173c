#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid value for parameter {name}: {value}")]
    InvalidValue { name: String, value: String },

    #[error("A positive polling period is required: {0}")]
    NonPositivePoll(f64),

    #[error("Smoothing window size must be at least 1")]
    EmptyWindow,

    #[error("Unsupported temperature unit: {0}")]
    UnsupportedUnit(String),

    #[error("Unsupported device class: {0}")]
    UnsupportedClass(String),

    #[error("Unknown connection: {0}")]
    UnknownConnection(String),
}

impl ConfigError {
    pub fn invalid(name: &str, value: &str) -> Self {
        ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}
