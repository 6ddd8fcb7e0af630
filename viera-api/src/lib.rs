//! High-level Panasonic Viera API for remote control
//!
//! This crate provides a type-safe, trait-based API for controlling Viera
//! televisions over their SOAP control endpoints on port 55000. It uses the
//! private `soap-client` crate for low-level SOAP communication.
//!
//! ```rust,no_run
//! use viera_api::{Command, DeviceEndpoint, VieraClient};
//!
//! # async fn demo() -> viera_api::Result<()> {
//! let client = VieraClient::new(DeviceEndpoint::new("192.168.1.20")?)?;
//! client.execute(&Command::SetVolume(25)).await?;
//! assert!(!client.get_mute().await?);
//! # Ok(())
//! # }
//! ```
//!
//! Televisions on newer firmware need an application id and encryption key from
//! pairing; attach them with [`DeviceEndpoint::with_credentials`] and the client
//! establishes and renews the encrypted session on its own.

pub mod client;
pub mod command;
pub mod crypto;
pub mod endpoint;
pub mod error;
pub mod keys;
pub mod operation;
pub mod operations;
pub mod response;
pub mod service;

pub use client::{CommandOutput, VieraClient};
pub use command::{encode, Command, EncodedRequest};
pub use crypto::SessionKeys;
pub use endpoint::{Credentials, DeviceEndpoint, DEFAULT_PORT};
pub use error::{ApiError, Result, TransportErrorKind};
pub use keys::{KeyCode, VieraKey};
pub use operation::{Backoff, InvalidParameter, RetryPolicy, VieraOperation};
pub use service::{Service, ServiceInfo};
