#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// Scratch directory laid out like `/sys/bus/w1/devices`.
pub struct W1Root {
    pub path: PathBuf,
}

impl W1Root {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!(
            "thermosync-w1-{}-{}",
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::SeqCst)
        ));
        fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a `w1_slave` file for `address` holding `millidegrees`.
    pub fn write_reading(&self, address: &str, millidegrees: i64, crc_ok: bool) {
        let device = self.path.join(address);
        fs::create_dir_all(&device).unwrap();

        let status = if crc_ok { "YES" } else { "NO" };
        let payload = format!(
            "72 01 4b 46 7f ff 0e 10 57 : crc=57 {status}\n72 01 4b 46 7f ff 0e 10 57 t={millidegrees}\n"
        );
        fs::write(device.join("w1_slave"), payload).unwrap();
    }
}

impl Drop for W1Root {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Local stand-in for a carbon plaintext listener.
pub struct CarbonServer {
    listener: TcpListener,
}

impl CarbonServer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self { listener }
    }

    pub fn port(&self) -> u16 {
        self.listener.local_addr().unwrap().port()
    }

    /// Accepts one connection and returns everything written to it.
    pub async fn receive(&self) -> String {
        let (mut socket, _) = self.listener.accept().await.unwrap();
        let mut received = String::new();
        socket.read_to_string(&mut received).await.unwrap();
        received
    }
}

/// Splits a plaintext line into destination, value and timestamp.
pub fn parse_line(line: &str) -> (String, String, i64) {
    let mut fields = line.trim_end().split(' ');
    let destination = fields.next().unwrap().to_string();
    let value = fields.next().unwrap().to_string();
    let timestamp = fields.next().unwrap().parse().unwrap();
    assert!(fields.next().is_none());
    (destination, value, timestamp)
}
