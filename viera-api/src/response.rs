//! Response field extraction
//!
//! Viera responses are flat and predictable, so fields are pulled straight out
//! of the raw text by tag name rather than through a DOM.

use crate::error::{ApiError, Result};

/// Return the text of the first `<tag>...</tag>` in `xml`
pub fn extract_field<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);

    let start = xml.find(&open)? + open.len();
    let end = start + xml[start..].find(&close)?;
    Some(&xml[start..end])
}

/// Parse `CurrentVolume` as a number in 0..=100
pub fn parse_volume(xml: &str) -> Result<u8> {
    let raw = extract_field(xml, "CurrentVolume")
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| ApiError::field_not_found("CurrentVolume"))?;

    raw.parse::<u8>()
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| ApiError::ProtocolError(format!("CurrentVolume out of range: {}", raw)))
}

/// Parse `CurrentMute` (`0` or `1`)
pub fn parse_mute(xml: &str) -> Result<bool> {
    match extract_field(xml, "CurrentMute").map(str::trim) {
        Some("1") => Ok(true),
        Some("0") => Ok(false),
        _ => Err(ApiError::field_not_found("CurrentMute")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const VOLUME_RESPONSE: &str = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
<s:Body><u:GetVolumeResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1">
<CurrentVolume>42</CurrentVolume>
</u:GetVolumeResponse></s:Body></s:Envelope>"#;

    #[test]
    fn test_extract_field_first_capture() {
        let xml = "<a><X>1</X><X>2</X></a>";
        assert_eq!(extract_field(xml, "X"), Some("1"));
        assert_eq!(extract_field(xml, "Y"), None);
        assert_eq!(extract_field("<X>unclosed", "X"), None);
    }

    #[test]
    fn test_parse_volume() {
        assert_eq!(parse_volume(VOLUME_RESPONSE).unwrap(), 42);
    }

    #[rstest]
    #[case("<a></a>")]
    #[case("<CurrentVolume></CurrentVolume>")]
    #[case("<CurrentVolume>loud</CurrentVolume>")]
    fn test_parse_volume_field_not_found(#[case] xml: &str) {
        match parse_volume(xml) {
            Err(ApiError::ProtocolError(msg)) => assert!(msg.contains("field not found")),
            other => panic!("Expected ProtocolError, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_volume_out_of_range() {
        assert!(matches!(
            parse_volume("<CurrentVolume>255</CurrentVolume>"),
            Err(ApiError::ProtocolError(_))
        ));
    }

    #[rstest]
    #[case("<CurrentMute>1</CurrentMute>", true)]
    #[case("<CurrentMute>0</CurrentMute>", false)]
    fn test_parse_mute(#[case] xml: &str, #[case] expected: bool) {
        assert_eq!(parse_mute(xml).unwrap(), expected);
    }

    #[test]
    fn test_parse_mute_missing_is_protocol_error() {
        let err = parse_mute(VOLUME_RESPONSE).unwrap_err();
        assert!(matches!(err, ApiError::ProtocolError(_)));
        assert!(!err.is_transport());

        assert!(parse_mute("<CurrentMute>2</CurrentMute>").is_err());
    }
}
