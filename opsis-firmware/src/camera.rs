//! Camera HTTP client
//!
//! One plain blocking GET per fetch cycle against the configured still
//! endpoint. The connection is owned by the returned stream and torn
//! down when the stream drops, whatever the cycle's outcome.

use std::time::Duration;

use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::EspIOError;
use esp_idf_svc::sys::EspError;
use thiserror::Error;

use opsis_core::fetch::{ByteStream, CameraClient};

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("esp-idf: {0}")]
    Esp(#[from] EspError),
    #[error("http i/o: {0}")]
    Io(#[from] EspIOError),
}

/// HTTP collaborator for the fetch reader
pub struct EspCamera {
    config: Configuration,
}

impl EspCamera {
    pub fn new() -> Self {
        Self {
            config: Configuration {
                timeout: Some(Duration::from_secs(10)),
                ..Default::default()
            },
        }
    }
}

impl CameraClient for EspCamera {
    type Stream = EspCameraStream;
    type Error = CameraError;

    fn get(&mut self, url: &str) -> Result<(u16, EspCameraStream), CameraError> {
        let mut conn = EspHttpConnection::new(&self.config)?;
        conn.initiate_request(Method::Get, url, &[])?;
        conn.initiate_response()?;

        let status = conn.status();
        let declared = conn
            .header("Content-Length")
            .and_then(|v| v.trim().parse::<usize>().ok());

        Ok((
            status,
            EspCameraStream {
                conn,
                declared,
                eof: false,
            },
        ))
    }
}

/// Open response body, live for one fetch cycle
pub struct EspCameraStream {
    conn: EspHttpConnection,
    declared: Option<usize>,
    eof: bool,
}

impl ByteStream for EspCameraStream {
    type Error = CameraError;

    fn declared_len(&self) -> Option<usize> {
        self.declared
    }

    fn connected(&self) -> bool {
        !self.eof
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CameraError> {
        use embedded_svc::io::Read;

        let n = self.conn.read(buf)?;
        if n == 0 {
            // Blocking read returning zero is end-of-body on ESP-IDF
            self.eof = true;
        }
        Ok(n)
    }
}
