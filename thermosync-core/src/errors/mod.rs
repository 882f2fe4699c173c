pub mod acquisition;
pub mod config;
pub mod publish;

pub use acquisition::AcquisitionError;
pub use config::ConfigError;
pub use publish::PublishError;
