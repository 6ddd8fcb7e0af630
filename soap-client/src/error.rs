//! Error types for the SOAP client

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during SOAP communication
#[derive(Debug, Error)]
pub enum SoapError {
    /// The device did not answer within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The TCP connection could not be established (refused, reset, unroutable)
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Any other network or HTTP client failure
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// The device answered with a non-2xx status
    ///
    /// `fault` carries the UPnP `errorCode` when the body was a SOAP fault.
    #[error("HTTP error status {status}")]
    Http { status: u16, fault: Option<u16> },

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    Parse(String),
}

impl SoapError {
    /// True for failures where the device never produced a response
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SoapError::Timeout(_) | SoapError::Connection(_) | SoapError::Network(_)
        )
    }
}
