pub mod transport;

use log::debug;
use thiserror::Error;

use crate::record::{self, RecordSet};

pub use transport::{ClientError, HttpTransport, Transport, TransportError, TransportResponse};

pub const DEFAULT_URL: &str =
    "https://raw.githubusercontent.com/saaslabsco/frontend-assignment/refs/heads/master/frontend-assignment.json";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("{0}")]
    Transport(String),

    #[error("HTTP error! status: {0}")]
    HttpStatus(u16),

    #[error("failed to parse response body: {0}")]
    Parse(String),
}

impl LoadError {
    /// The response status, when the failure came from a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus(code) => Some(*code),
            _ => None,
        }
    }
}

/// Fetches `url` once and returns the validated records.
///
/// An empty result is a success. There is no retry and no timeout here; the
/// transport owns both.
pub async fn load<T>(transport: &T, url: &str) -> Result<RecordSet, LoadError>
where
    T: Transport + ?Sized,
{
    debug!("fetching projects from {url}");
    let response = transport
        .get(url)
        .await
        .map_err(|e| LoadError::Transport(e.to_string()))?;
    debug!(
        "fetch response: status {}, {} bytes",
        response.status,
        response.body.len()
    );

    if !response.is_success() {
        return Err(LoadError::HttpStatus(response.status));
    }

    let data: serde_json::Value =
        serde_json::from_slice(&response.body).map_err(|e| LoadError::Parse(e.to_string()))?;
    let records = record::records_from_payload(data);
    debug!("valid projects: {}", records.len());

    Ok(records.into())
}
