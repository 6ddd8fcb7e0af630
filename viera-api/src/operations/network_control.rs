//! NetworkControl service operations
//!
//! # Operations
//! - `X_SendKey` - press a remote-control button
//! - `X_GetEncryptSessionId` - open an encrypted session
//! - `X_EncryptedCommand` - carry an encrypted command inside a session

use crate::error::ApiError;
use crate::keys::KeyCode;
use crate::operation::{InvalidParameter, Validate};
use crate::response::extract_field;
use crate::define_viera_operation;
use paste::paste;

// =============================================================================
// SEND KEY
// =============================================================================

define_viera_operation! {
    operation: SendKeyOperation,
    action: "X_SendKey",
    service: NetworkControl,
    request: {
        key: KeyCode,
    },
    response: (),
    payload: |req| {
        format!(
            "<X_KeyEvent>NRC_{}-ONOFF</X_KeyEvent>",
            req.key.as_str().to_uppercase()
        )
    },
    parse: |_xml| Ok(()),
}

impl Validate for SendKeyOperationRequest {
    fn validate(&self) -> Result<(), InvalidParameter> {
        if self.key.as_str().trim().is_empty() {
            return Err(InvalidParameter::empty("key"));
        }
        Ok(())
    }
}

// =============================================================================
// GET ENCRYPT SESSION ID
// =============================================================================

define_viera_operation! {
    operation: GetEncryptSessionIdOperation,
    action: "X_GetEncryptSessionId",
    service: NetworkControl,
    request: {
        application_id: String,
        enc_info: String,
    },
    response: String,
    payload: |req| encrypted_params(&req.application_id, &req.enc_info),
    parse: |xml| {
        extract_field(xml, "X_EncResult")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::field_not_found("X_EncResult"))
    },
}

impl Validate for GetEncryptSessionIdOperationRequest {
    fn validate(&self) -> Result<(), InvalidParameter> {
        validate_application_id(&self.application_id)
    }
}

// =============================================================================
// ENCRYPTED COMMAND
// =============================================================================

define_viera_operation! {
    operation: EncryptedCommandOperation,
    action: "X_EncryptedCommand",
    service: NetworkControl,
    request: {
        application_id: String,
        enc_info: String,
    },
    // Some firmware answers without an X_EncResult
    response: Option<String>,
    payload: |req| encrypted_params(&req.application_id, &req.enc_info),
    parse: |xml| {
        Ok(extract_field(xml, "X_EncResult")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    },
}

impl Validate for EncryptedCommandOperationRequest {
    fn validate(&self) -> Result<(), InvalidParameter> {
        validate_application_id(&self.application_id)
    }
}

fn encrypted_params(application_id: &str, enc_info: &str) -> String {
    format!(
        "<X_ApplicationId>{}</X_ApplicationId><X_EncInfo>{}</X_EncInfo>",
        application_id, enc_info
    )
}

fn validate_application_id(application_id: &str) -> Result<(), InvalidParameter> {
    if application_id.is_empty() {
        return Err(InvalidParameter::empty("application_id"));
    }
    Ok(())
}
