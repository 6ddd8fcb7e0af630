/// Represents the UPnP control services exposed by Viera televisions
///
/// Each service owns one control path and one URN. A command always travels
/// on the pair belonging to its service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Vendor network remote control - key presses and session setup
    NetworkControl,

    /// Standard DLNA RenderingControl - volume and mute
    RenderingControl,
}

/// Contains the control path and URN for a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// The HTTP control path on the device
    pub path: &'static str,

    /// The service URN, without the leading `urn:`
    pub urn: &'static str,
}

impl Service {
    /// Get the name of this service as a string
    pub fn name(&self) -> &'static str {
        match self {
            Service::NetworkControl => "NetworkControl",
            Service::RenderingControl => "RenderingControl",
        }
    }

    /// Get the control path and URN for this service
    pub fn info(&self) -> ServiceInfo {
        match self {
            Service::NetworkControl => ServiceInfo {
                path: "/nrc/control_0",
                urn: "panasonic-com:service:p00NetworkControl:1",
            },
            Service::RenderingControl => ServiceInfo {
                path: "/dmr/control_0",
                urn: "schemas-upnp-org:service:RenderingControl:1",
            },
        }
    }
}
