use async_trait::async_trait;
use thermosync_core::{PublishError, PublishSink};

/// Writes every published value to the log instead of the network.
pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl PublishSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, value: &str, destination: &str) -> Result<(), PublishError> {
        tracing::info!(sink = %self.name, "{} = {}", destination, value);
        Ok(())
    }
}
