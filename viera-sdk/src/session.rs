//! Per-device session state machine
//!
//! ```text
//! Unknown -> Probing -> Alive -> Connecting -> Ready -> (commands) -> Ready
//!                    \-> Unreachable          \-> AuthFailed
//! ```
//!
//! There is no terminal phase. `Unreachable` and `AuthFailed` fall back to
//! `Unknown` when the next probe starts, and a failed command drops `Ready` back
//! to `Unknown`. Every failure forgets the last observed volume and mute; the
//! next answered command restores `Ready`. Probes started while a session is
//! connecting or ready only update reachability.

use serde::Serialize;
use tracing::{debug, warn};

/// Where a device session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Unknown,
    Probing,
    Alive,
    Unreachable,
    Connecting,
    Ready,
    AuthFailed,
}

/// Something that happened to a device session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ProbeStarted,
    ProbeSucceeded,
    ProbeFailed,
    ConnectStarted,
    Connected,
    AuthRejected,
    /// A command completed without returning a value
    CommandSucceeded,
    VolumeObserved(u8),
    MuteObserved(bool),
    CommandFailed,
}

/// Soft session state of one television
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    /// Last reachability probe succeeded
    pub connected: bool,
    /// Last render query was answered
    pub last_known_alive: bool,
    pub last_volume: Option<u8>,
    pub last_mute: Option<bool>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Unknown,
            connected: false,
            last_known_alive: false,
            last_volume: None,
            last_mute: None,
        }
    }

    /// Apply an event, returning whether it was a valid transition
    ///
    /// Invalid events are logged and leave the state untouched.
    pub fn apply(&mut self, event: SessionEvent) -> bool {
        use SessionEvent::*;
        use SessionPhase::*;

        let next = match (self.phase, event) {
            (Unreachable | AuthFailed, ProbeStarted) => {
                debug!(from = ?self.phase, "session reset before probe");
                self.forget();
                Probing
            }
            (Unknown | Alive, ProbeStarted) => Probing,
            // A probe runs alongside an open session without replacing it
            (Connecting | Ready, ProbeStarted) => self.phase,
            (Probing, ProbeSucceeded) => {
                self.connected = true;
                Alive
            }
            (Connecting | Ready, ProbeSucceeded) => {
                self.connected = true;
                self.phase
            }
            (Probing | Connecting | Ready, ProbeFailed) => {
                self.connected = false;
                self.forget();
                Unreachable
            }
            (Unknown | Probing | Alive, ConnectStarted) => Connecting,
            (Connecting, Connected) => Ready,
            (Connecting | Ready, AuthRejected) => {
                self.forget();
                AuthFailed
            }
            // An answered command proves the session works again
            (Unknown | Alive | Ready, CommandSucceeded) => Ready,
            (Unknown | Alive | Ready, VolumeObserved(volume)) => {
                self.last_known_alive = true;
                self.last_volume = Some(volume);
                Ready
            }
            (Unknown | Alive | Ready, MuteObserved(mute)) => {
                self.last_known_alive = true;
                self.last_mute = Some(mute);
                Ready
            }
            (Unknown | Connecting | Ready, CommandFailed) => {
                self.forget();
                Unknown
            }
            (phase, event) => {
                warn!(?phase, ?event, "ignoring invalid session transition");
                return false;
            }
        };

        if next != self.phase {
            debug!(from = ?self.phase, to = ?next, "session transition");
        }
        self.phase = next;
        true
    }

    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    fn forget(&mut self) {
        self.last_known_alive = false;
        self.last_volume = None;
        self.last_mute = None;
    }
}
