//! Outbound state reporting
//!
//! The host framework owns the state objects; the controller only pushes
//! `(key, value, ack)` updates through a [`StateSink`].

use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;

/// State keys reported by the controller
pub mod keys {
    /// Reachability of the television
    pub const CONNECTION: &str = "info.connection";
    /// Whether the television answered a render query
    pub const TV_ON: &str = "info.tv_on";
    pub const VOLUME: &str = "volume";
    pub const MUTE: &str = "mute";
}

/// A reported value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool(bool),
    Number(u8),
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Bool(b) => write!(f, "{}", b),
            StateValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        StateValue::Bool(value)
    }
}

impl From<u8> for StateValue {
    fn from(value: u8) -> Self {
        StateValue::Number(value)
    }
}

/// Receives state updates from the controller
pub trait StateSink: Send + Sync {
    fn set_value(&self, key: &str, value: StateValue, ack: bool);
}

/// One update as received by a [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateUpdate {
    pub key: String,
    pub value: StateValue,
    pub ack: bool,
}

/// Sink that keeps every update in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    updates: Mutex<Vec<StateUpdate>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All updates in arrival order
    pub fn updates(&self) -> Vec<StateUpdate> {
        self.updates.lock().clone()
    }

    /// Most recent value reported for `key`
    pub fn last(&self, key: &str) -> Option<StateValue> {
        self.updates
            .lock()
            .iter()
            .rev()
            .find(|u| u.key == key)
            .map(|u| u.value)
    }

    /// Number of updates reported for `key`
    pub fn count(&self, key: &str) -> usize {
        self.updates.lock().iter().filter(|u| u.key == key).count()
    }

    pub fn clear(&self) {
        self.updates.lock().clear();
    }
}

impl StateSink for MemorySink {
    fn set_value(&self, key: &str, value: StateValue, ack: bool) {
        self.updates.lock().push(StateUpdate {
            key: key.to_string(),
            value,
            ack,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_tracks_last_value() {
        let sink = MemorySink::new();
        sink.set_value(keys::VOLUME, 10.into(), true);
        sink.set_value(keys::MUTE, false.into(), true);
        sink.set_value(keys::VOLUME, 12.into(), true);

        assert_eq!(sink.last(keys::VOLUME), Some(StateValue::Number(12)));
        assert_eq!(sink.last(keys::MUTE), Some(StateValue::Bool(false)));
        assert_eq!(sink.last(keys::TV_ON), None);
        assert_eq!(sink.count(keys::VOLUME), 2);
        assert_eq!(sink.updates().len(), 3);

        sink.clear();
        assert!(sink.updates().is_empty());
    }

    #[test]
    fn test_state_values_serialize_bare() {
        assert_eq!(serde_json::to_string(&StateValue::Number(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&StateValue::Bool(true)).unwrap(), "true");
    }
}
