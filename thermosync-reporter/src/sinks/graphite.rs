use std::io;
use std::time::Duration;

use async_trait::async_trait;
use thermosync_core::{ConfigError, Params, PublishError, PublishSink};
use time::OffsetDateTime;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Carbon plaintext sink: one fresh TCP connection per value.
pub struct GraphiteSink {
    name: String,
    server: String,
    port: u16,
    timeout: Duration,
}

impl GraphiteSink {
    pub fn new(name: impl Into<String>, server: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            server: server.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_params(name: &str, params: &Params) -> Result<Self, ConfigError> {
        let server = params.require("Server")?;
        let port = params
            .parse::<u16>("Port")?
            .ok_or_else(|| ConfigError::MissingParameter("Port".to_string()))?;

        let mut sink = Self::new(name, server, port);
        if let Some(secs) = params.parse::<f64>("Timeout")? {
            let timeout = Duration::try_from_secs_f64(secs)
                .ok()
                .filter(|timeout| !timeout.is_zero())
                .ok_or_else(|| ConfigError::invalid("Timeout", params.get("Timeout").unwrap_or_default()))?;
            sink = sink.with_timeout(timeout);
        }

        Ok(sink)
    }

    async fn send(&self, line: &str) -> io::Result<()> {
        let mut stream = TcpStream::connect((self.server.as_str(), self.port)).await?;
        stream.write_all(line.as_bytes()).await?;
        stream.shutdown().await
    }
}

pub fn format_line(destination: &str, value: &str, timestamp: i64) -> String {
    format!("{destination} {value} {timestamp}\n")
}

#[async_trait]
impl PublishSink for GraphiteSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, value: &str, destination: &str) -> Result<(), PublishError> {
        let line = format_line(destination, value, OffsetDateTime::now_utc().unix_timestamp());
        tracing::info!("Publish message: {}", line.trim_end());

        timeout(self.timeout, self.send(&line))
            .await
            .map_err(|_| PublishError::Timeout)??;

        Ok(())
    }
}
