//! RenderingControl service operations
//!
//! # Operations
//! - `GetVolume` - current volume level (0-100)
//! - `SetVolume` - set the volume level (0-100)
//! - `GetMute` - current mute state
//! - `SetMute` - set the mute state

use crate::operation::{InvalidParameter, Validate};
use crate::response::{parse_mute, parse_volume};
use crate::define_viera_operation;
use paste::paste;

/// Instance and channel selector that prefixes every render payload
pub const MASTER_CHANNEL: &str = "<InstanceID>0</InstanceID><Channel>Master</Channel>";

// =============================================================================
// GET VOLUME
// =============================================================================

define_viera_operation! {
    operation: GetVolumeOperation,
    action: "GetVolume",
    service: RenderingControl,
    request: {},
    response: u8,
    payload: |_req| MASTER_CHANNEL.to_string(),
    parse: |xml| parse_volume(xml),
}

impl Validate for GetVolumeOperationRequest {}

// =============================================================================
// SET VOLUME
// =============================================================================

define_viera_operation! {
    operation: SetVolumeOperation,
    action: "SetVolume",
    service: RenderingControl,
    request: {
        desired_volume: i64,
    },
    response: (),
    payload: |req| {
        format!(
            "{}<DesiredVolume>{}</DesiredVolume>",
            MASTER_CHANNEL, req.desired_volume
        )
    },
    parse: |_xml| Ok(()),
}

impl Validate for SetVolumeOperationRequest {
    fn validate(&self) -> Result<(), InvalidParameter> {
        if !(0..=100).contains(&self.desired_volume) {
            return Err(InvalidParameter::out_of_range("desired_volume", 0..=100, self.desired_volume));
        }
        Ok(())
    }
}

// =============================================================================
// GET MUTE
// =============================================================================

define_viera_operation! {
    operation: GetMuteOperation,
    action: "GetMute",
    service: RenderingControl,
    request: {},
    response: bool,
    payload: |_req| MASTER_CHANNEL.to_string(),
    parse: |xml| parse_mute(xml),
}

impl Validate for GetMuteOperationRequest {}

// =============================================================================
// SET MUTE
// =============================================================================

define_viera_operation! {
    operation: SetMuteOperation,
    action: "SetMute",
    service: RenderingControl,
    request: {
        desired_mute: bool,
    },
    response: (),
    payload: |req| {
        format!(
            "{}<DesiredMute>{}</DesiredMute>",
            MASTER_CHANNEL,
            if req.desired_mute { "1" } else { "0" }
        )
    },
    parse: |_xml| Ok(()),
}

impl Validate for SetMuteOperationRequest {}
