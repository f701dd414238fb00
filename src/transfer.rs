use std::io::{Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::MvdlError;

#[derive(Debug, Clone, Copy)]
pub struct TransferInfo {
    pub bytes: u64,
    pub elapsed: Duration,
}

pub trait TransferObserver: Send + Sync {
    fn on_progress(&self, _transferred: u64, _total: Option<u64>) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NopObserver;

impl TransferObserver for NopObserver {}

pub trait TransferClient: Send + Sync {
    fn fetch(&self, url: &str, destination: &Path) -> Result<TransferInfo, MvdlError>;
}

pub struct HttpTransferClient {
    client: Client,
    observer: Box<dyn TransferObserver>,
}

impl HttpTransferClient {
    pub fn new() -> Result<Self, MvdlError> {
        Self::with_observer(Box::new(NopObserver))
    }

    pub fn with_observer(observer: Box<dyn TransferObserver>) -> Result<Self, MvdlError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("mediathek-dl/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| MvdlError::TransferHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(None)
            .connect_timeout(Duration::from_secs(30))
            .read_timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| MvdlError::TransferHttp(err.to_string()))?;
        Ok(Self { client, observer })
    }
}

impl TransferClient for HttpTransferClient {
    fn fetch(&self, url: &str, destination: &Path) -> Result<TransferInfo, MvdlError> {
        let start = Instant::now();
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| MvdlError::TransferHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .status()
                .canonical_reason()
                .unwrap_or("transfer failed")
                .to_string();
            return Err(MvdlError::TransferStatus { status, message });
        }

        let total = response.content_length();
        let parent = destination
            .parent()
            .ok_or_else(|| MvdlError::Filesystem("invalid destination path".to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix("mediathek-dl")
            .tempfile_in(parent)
            .map_err(|err| MvdlError::Filesystem(err.to_string()))?;

        let mut buf = [0u8; 64 * 1024];
        let mut transferred = 0u64;
        loop {
            let n = response
                .read(&mut buf)
                .map_err(|err| MvdlError::TransferHttp(err.to_string()))?;
            if n == 0 {
                break;
            }
            temp.write_all(&buf[..n])
                .map_err(|err| MvdlError::Filesystem(err.to_string()))?;
            transferred += n as u64;
            self.observer.on_progress(transferred, total);
        }

        temp.persist(destination)
            .map_err(|err| MvdlError::Filesystem(err.to_string()))?;
        Ok(TransferInfo {
            bytes: transferred,
            elapsed: start.elapsed(),
        })
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0usize;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let prefixes = ["K", "M", "G", "T", "P", "E"];
    format!("{:.1} {}iB", bytes as f64 / div as f64, prefixes[exp])
}
