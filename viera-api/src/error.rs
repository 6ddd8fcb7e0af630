use soap_client::SoapError;
use std::fmt;
use thiserror::Error;

/// Which part of the transport failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// No response arrived within the request timeout
    Timeout,
    /// The connection was refused, reset or could not be routed
    Connection,
    /// Any other failure below the HTTP layer
    Network,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connection => "connection",
            TransportErrorKind::Network => "network",
        };
        f.write_str(name)
    }
}

/// High-level API errors for Viera operations
///
/// Every failure of the client maps onto one of these four classes so callers
/// can tell bad input, an unreachable TV, a misbehaving TV and a rejected
/// session apart.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid caller input
    ///
    /// Returned before anything is sent over the wire, e.g. a volume outside
    /// 0..=100 or a malformed IP address.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The device did not respond
    ///
    /// Covers connection refusal, DNS/routing failures and timeouts. The
    /// `kind` distinguishes a timeout from a refused connection.
    #[error("Transport error ({kind}): {message}")]
    TransportError {
        kind: TransportErrorKind,
        message: String,
    },

    /// The device responded but not as expected
    ///
    /// Non-2xx HTTP status, unparsable XML or a missing response field.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// The encrypted session handshake was rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
}

impl ApiError {
    /// Error for a response that lacks the expected element
    pub fn field_not_found(field: &str) -> Self {
        Self::ProtocolError(format!("field not found: {}", field))
    }

    /// True when the device never produced a response
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::TransportError { .. })
    }

    /// True when the request timed out
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ApiError::TransportError {
                kind: TransportErrorKind::Timeout,
                ..
            }
        )
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

/// Convert from SoapError to ApiError
impl From<SoapError> for ApiError {
    fn from(error: SoapError) -> Self {
        let message = error.to_string();
        match error {
            SoapError::Timeout(_) => ApiError::TransportError {
                kind: TransportErrorKind::Timeout,
                message,
            },
            SoapError::Connection(_) => ApiError::TransportError {
                kind: TransportErrorKind::Connection,
                message,
            },
            SoapError::Network(_) => ApiError::TransportError {
                kind: TransportErrorKind::Network,
                message,
            },
            SoapError::Http {
                status,
                fault: Some(code),
            } => ApiError::ProtocolError(format!("HTTP status {} (UPnP error {})", status, code)),
            SoapError::Http { status, fault: None } => {
                ApiError::ProtocolError(format!("HTTP status {}", status))
            }
            SoapError::Parse(msg) => ApiError::ProtocolError(format!("malformed XML: {}", msg)),
        }
    }
}

impl From<crate::operation::InvalidParameter> for ApiError {
    fn from(error: crate::operation::InvalidParameter) -> Self {
        ApiError::InvalidArgument(error.to_string())
    }
}
