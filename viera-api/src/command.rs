//! Command Encoder
//!
//! Maps a [`Command`] onto the service, path, URN, action and SOAP body that
//! carry it. Encoding is pure: validation failures surface here, before any
//! network traffic.

use crate::error::Result;
use crate::keys::KeyCode;
use crate::operation::VieraOperation;
use crate::operations::network_control::{SendKeyOperation, SendKeyOperationRequest};
use crate::operations::rendering_control::{
    GetMuteOperation, GetMuteOperationRequest, GetVolumeOperation, GetVolumeOperationRequest,
    SetMuteOperation, SetMuteOperationRequest, SetVolumeOperation, SetVolumeOperationRequest,
};
use crate::service::Service;

/// A logical command for the television
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Press a remote-control button
    Key(KeyCode),
    GetVolume,
    /// Must be within 0..=100
    SetVolume(i64),
    GetMute,
    SetMute(bool),
}

impl Command {
    /// Whether the command can be repeated without changing device state
    ///
    /// Key presses may toggle (power, mute), so only the queries qualify.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Command::GetVolume | Command::GetMute)
    }

    pub fn service(&self) -> Service {
        match self {
            Command::Key(_) => Service::NetworkControl,
            Command::GetVolume | Command::SetVolume(_) | Command::GetMute | Command::SetMute(_) => {
                Service::RenderingControl
            }
        }
    }
}

/// A fully encoded request, ready for transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRequest {
    pub service: Service,
    pub path: &'static str,
    pub urn: &'static str,
    pub action: &'static str,
    /// The XML placed inside the action element
    pub fragment: String,
    /// Value of the `SOAPACTION` header
    pub soap_action: String,
    /// The complete SOAP envelope
    pub body: String,
    pub content_length: usize,
}

impl EncodedRequest {
    pub fn new(service: Service, action: &'static str, fragment: String) -> Self {
        let info = service.info();
        let body = soap_client::envelope(info.urn, action, &fragment);
        Self {
            service,
            path: info.path,
            urn: info.urn,
            action,
            soap_action: soap_client::soap_action(info.urn, action),
            content_length: body.len(),
            fragment,
            body,
        }
    }
}

/// Encode a single operation request
pub fn encode_operation<Op: VieraOperation>(request: &Op::Request) -> Result<EncodedRequest> {
    let fragment = Op::build_payload(request)?;
    Ok(EncodedRequest::new(Op::SERVICE, Op::ACTION, fragment))
}

/// Encode a logical command
pub fn encode(command: &Command) -> Result<EncodedRequest> {
    match command {
        Command::Key(key) => {
            encode_operation::<SendKeyOperation>(&SendKeyOperationRequest { key: key.clone() })
        }
        Command::GetVolume => encode_operation::<GetVolumeOperation>(&GetVolumeOperationRequest {}),
        Command::SetVolume(volume) => encode_operation::<SetVolumeOperation>(&SetVolumeOperationRequest {
            desired_volume: *volume,
        }),
        Command::GetMute => encode_operation::<GetMuteOperation>(&GetMuteOperationRequest {}),
        Command::SetMute(mute) => {
            encode_operation::<SetMuteOperation>(&SetMuteOperationRequest { desired_mute: *mute })
        }
    }
}
