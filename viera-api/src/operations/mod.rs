//! Operation definitions
//!
//! Organized by service:
//! - `network_control` - key presses and encrypted session setup
//! - `rendering_control` - volume and mute

pub mod network_control;
pub mod rendering_control;
