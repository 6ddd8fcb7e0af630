use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::{ApiError, Result};

/// Control port of every Viera set
pub const DEFAULT_PORT: u16 = 55000;

/// Pairing credentials for an encrypted session
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_id: String,
    pub encryption_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("encryption_key", &"<redacted>")
            .finish()
    }
}

/// The address of one television, plus optional pairing credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    ip: Ipv4Addr,
    port: u16,
    credentials: Option<Credentials>,
}

impl DeviceEndpoint {
    /// Create an endpoint for a dotted-quad IPv4 address on port 55000
    pub fn new(ip: &str) -> Result<Self> {
        let ip = Ipv4Addr::from_str(ip.trim())
            .map_err(|_| ApiError::InvalidArgument(format!("invalid IPv4 address: {:?}", ip)))?;
        Ok(Self {
            ip,
            port: DEFAULT_PORT,
            credentials: None,
        })
    }

    /// Attach pairing credentials; commands will then require a session handshake
    pub fn with_credentials(mut self, app_id: impl Into<String>, encryption_key: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            app_id: app_id.into(),
            encryption_key: encryption_key.into(),
        });
        self
    }

    /// Override the control port (port-forwarded sets, test fixtures)
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `ip:port` as used in the request URL
    pub fn host(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}
