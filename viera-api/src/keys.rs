//! Remote-button vocabulary
//!
//! [`VieraKey`] lists the buttons known to work on Viera sets. The wire format
//! is `NRC_{CODE}-ONOFF`; [`KeyCode`] carries any code, known or not, so
//! undocumented buttons can still be pressed.

use std::fmt;
use std::str::FromStr;

macro_rules! define_keys {
    ($($variant:ident => $code:literal),* $(,)?) => {
        /// A known Viera remote-control button
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum VieraKey {
            $($variant,)*
        }

        impl VieraKey {
            /// Every known key, in declaration order
            pub const ALL: &'static [VieraKey] = &[$(VieraKey::$variant,)*];

            /// The NRC code sent between `NRC_` and `-ONOFF`
            pub fn code(&self) -> &'static str {
                match self {
                    $(VieraKey::$variant => $code,)*
                }
            }
        }
    };
}

define_keys! {
    ThirtySecondSkip => "30S_SKIP",
    Toggle3d => "3D",
    Apps => "APPS",
    Aspect => "ASPECT",
    Back => "BACK",
    Blue => "BLUE",
    Cancel => "CANCEL",
    ClosedCaption => "CC",
    ChatMode => "CHAT",
    ChannelDown => "CH_DOWN",
    Input => "CHG_INPUT",
    Network => "CHG_NETWORK",
    ChannelUp => "CH_UP",
    Num0 => "D0",
    Num1 => "D1",
    Num2 => "D2",
    Num3 => "D3",
    Num4 => "D4",
    Num5 => "D5",
    Num6 => "D6",
    Num7 => "D7",
    Num8 => "D8",
    Num9 => "D9",
    DigaControl => "DIGA_CTL",
    Display => "DISP_MODE",
    Down => "DOWN",
    Enter => "ENTER",
    Epg => "EPG",
    Exit => "EXIT",
    EzSync => "EZ_SYNC",
    Favorite => "FAVORITE",
    FastForward => "FF",
    Game => "GAME",
    Green => "GREEN",
    Guide => "GUIDE",
    Hold => "HOLD",
    Home => "HOME",
    Index => "INDEX",
    Info => "INFO",
    Connect => "INTERNET",
    Left => "LEFT",
    Menu => "MENU",
    Mpx => "MPX",
    Mute => "MUTE",
    NetBs => "NET_BS",
    NetCs => "NET_CS",
    NetTd => "NET_TD",
    OffTimer => "OFFTIMER",
    Pause => "PAUSE",
    Pictai => "PICTAI",
    Play => "PLAY",
    PictureNoiseReduction => "P_NR",
    Power => "POWER",
    Program => "PROG",
    Record => "REC",
    Red => "RED",
    Return => "RETURN",
    Rewind => "REW",
    Right => "RIGHT",
    RScreen => "R_SCREEN",
    LastView => "R_TUNE",
    Sap => "SAP",
    ToggleSdCard => "SD_CARD",
    SkipNext => "SKIP_NEXT",
    SkipPrev => "SKIP_PREV",
    Split => "SPLIT",
    Stop => "STOP",
    Subtitles => "STTL",
    OptionMenu => "SUBMENU",
    Surround => "SURROUND",
    Swap => "SWAP",
    Text => "TEXT",
    Tv => "TV",
    Up => "UP",
    Link => "VIERA_LINK",
    VolumeDown => "VOLDOWN",
    VolumeUp => "VOLUP",
    VTools => "VTOOLS",
    Yellow => "YELLOW",
}

/// Error returned when a string is not a known key code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key code: {0}")]
pub struct UnknownKey(pub String);

impl FromStr for VieraKey {
    type Err = UnknownKey;

    /// Case-insensitive lookup by NRC code
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VieraKey::ALL
            .iter()
            .copied()
            .find(|key| key.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

impl fmt::Display for VieraKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A key code as sent on the wire
///
/// Not restricted to [`VieraKey`]; whatever is stored here is forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCode(String);

impl KeyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The known key this code refers to, if any
    pub fn known(&self) -> Option<VieraKey> {
        self.0.parse().ok()
    }
}

impl From<VieraKey> for KeyCode {
    fn from(key: VieraKey) -> Self {
        Self(key.code().to_string())
    }
}

impl From<&str> for KeyCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for KeyCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
