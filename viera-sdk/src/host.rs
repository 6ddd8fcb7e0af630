//! Host state ids to device commands
//!
//! The host addresses states as `<namespace>.<channel>.<STATE>`; only the last
//! two segments matter. Remote buttons live in a channel (`basic.UP`,
//! `channel.D1`, `others.30S_SKIP`), while `basic.mute`, `basic.volume`,
//! `basic.VOLUP` and `basic.VOLDOWN` are render commands whose result is read
//! back. Ids that match nothing are sent as a raw key code.

use serde_json::Value;
use viera_api::{ApiError, KeyCode, VieraKey};

/// A command requested by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Set mute, then read it back
    SetMute(bool),
    /// Set the volume, then read it back
    SetVolume(i64),
    /// Press a volume key, then read the volume back
    VolumeStep(VieraKey),
    /// Press a button
    Key(KeyCode),
}

impl HostCommand {
    /// Map a host state id and value onto a command
    pub fn from_state(id: &str, value: &Value) -> Result<Self, ApiError> {
        let command = command_id(id);

        match command.as_str() {
            "basic.mute" => Ok(HostCommand::SetMute(truthy(value))),
            "basic.volume" => volume_value(value).map(HostCommand::SetVolume),
            "basic.VOLUP" => Ok(HostCommand::VolumeStep(VieraKey::VolumeUp)),
            "basic.VOLDOWN" => Ok(HostCommand::VolumeStep(VieraKey::VolumeDown)),
            _ => Ok(match lookup_key(&command) {
                Some(key) => HostCommand::Key(key.into()),
                None => HostCommand::Key(KeyCode::from(last_segment(id))),
            }),
        }
    }
}

/// The host state id of a known button, e.g. `basic.UP`
pub fn state_id(key: VieraKey) -> String {
    format!("{}.{}", channel(key), key.code())
}

/// Channel a button is published under
pub fn channel(key: VieraKey) -> &'static str {
    use VieraKey::*;

    match key {
        Back | Blue | Cancel | Down | Enter | Exit | Green | Left | Mute | Power | Red | Return
        | Right | Up | VolumeDown | VolumeUp | Yellow => "basic",
        ChannelDown | ChannelUp | Num0 | Num1 | Num2 | Num3 | Num4 | Num5 | Num6 | Num7 | Num8
        | Num9 => "channel",
        Input => "input",
        Epg | Guide | Index | Info | Menu | Text | VTools => "info",
        FastForward | Pause | Play | Record | Rewind | SkipNext | SkipPrev | Stop => "player",
        _ => "others",
    }
}

fn command_id(id: &str) -> String {
    let segments: Vec<&str> = id.split('.').collect();
    let start = segments.len().saturating_sub(2);
    segments[start..].join(".")
}

fn last_segment(id: &str) -> &str {
    id.rsplit('.').next().unwrap_or(id)
}

fn lookup_key(command: &str) -> Option<VieraKey> {
    let (group, code) = command.split_once('.')?;
    VieraKey::ALL
        .iter()
        .copied()
        .find(|key| channel(*key) == group && key.code().eq_ignore_ascii_case(code))
}

/// Host truthiness: `false`, `0`, `null`, `""`, `"0"` and `"false"` are false
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => {
            let s = s.trim();
            !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
        }
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn volume_value(value: &Value) -> Result<i64, ApiError> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| ApiError::InvalidArgument(format!("volume must be an integer, got {}", value)))
}
