//! Private SOAP client for UPnP device communication
//!
//! This crate provides a minimal asynchronous SOAP client specifically designed
//! for talking to the control endpoints of Panasonic Viera televisions. It builds
//! SOAP 1.1 envelopes, posts them with the vendor headers and classifies every
//! failure so callers can tell an unreachable device from a misbehaving one.

mod error;

pub use error::SoapError;

use std::time::Duration;
use tracing::debug;
use xmltree::{Element, XMLNode};

/// Default bound applied to every request (connect + response read)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the `SOAPACTION` header value for a service URN and action
///
/// The URN is given without the `urn:` prefix, e.g.
/// `panasonic-com:service:p00NetworkControl:1`.
pub fn soap_action(urn: &str, action: &str) -> String {
    format!("\"urn:{}#{}\"", urn, action)
}

/// Wrap an action fragment in a SOAP 1.1 envelope
pub fn envelope(urn: &str, action: &str, fragment: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">"#,
            "<s:Body>",
            r#"<u:{action} xmlns:u="urn:{urn}">{fragment}</u:{action}>"#,
            "</s:Body>",
            "</s:Envelope>"
        ),
        action = action,
        urn = urn,
        fragment = fragment
    )
}

/// A minimal async SOAP client for UPnP device communication
#[derive(Debug, Clone)]
pub struct SoapClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl SoapClient {
    /// Create a new SOAP client with the default 5 second timeout
    pub fn new() -> Result<Self, SoapError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a SOAP client with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, SoapError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            // Viera firmware answers one request per connection
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| SoapError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, timeout })
    }

    /// The timeout applied to each request
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wrap `fragment` in an envelope and send it, returning the raw response body
    pub async fn call(
        &self,
        host: &str,
        path: &str,
        urn: &str,
        action: &str,
        fragment: &str,
    ) -> Result<String, SoapError> {
        let body = envelope(urn, action, fragment);
        self.post(host, path, &soap_action(urn, action), body).await
    }

    /// POST a complete SOAP body to `http://{host}{path}`
    ///
    /// `host` is `ip:port`. A 2xx response is returned as text once it has been
    /// checked for well-formed XML (an empty body is accepted). Non-2xx statuses
    /// become [`SoapError::Http`] with the UPnP fault code when one is present.
    pub async fn post(
        &self,
        host: &str,
        path: &str,
        soap_action: &str,
        body: String,
    ) -> Result<String, SoapError> {
        let url = format!("http://{}{}", host, path);
        debug!(%url, %soap_action, bytes = body.len(), "sending SOAP request");

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "text/xml; charset=\"utf-8\"")
            .header("SOAPACTION", soap_action)
            .body(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(e))?;
        debug!(%url, status = status.as_u16(), bytes = text.len(), "received SOAP response");

        if !status.is_success() {
            return Err(SoapError::Http {
                status: status.as_u16(),
                fault: fault_code(&text),
            });
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            Element::parse(trimmed.as_bytes()).map_err(|e| SoapError::Parse(e.to_string()))?;
        }

        Ok(text)
    }

    fn classify(&self, error: reqwest::Error) -> SoapError {
        if error.is_timeout() {
            SoapError::Timeout(self.timeout)
        } else if error.is_connect() {
            SoapError::Connection(error.to_string())
        } else {
            SoapError::Network(error.to_string())
        }
    }
}

/// Extract the UPnP `errorCode` from a SOAP fault body
pub fn fault_code(xml: &str) -> Option<u16> {
    let root = Element::parse(xml.trim().as_bytes()).ok()?;
    find_descendant(&root, "errorCode")
        .and_then(|e| e.get_text())
        .and_then(|t| t.trim().parse::<u16>().ok())
}

fn find_descendant<'a>(element: &'a Element, name: &str) -> Option<&'a Element> {
    if element.name == name {
        return Some(element);
    }
    element
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .find_map(|child| find_descendant(child, name))
}
