//! Bridge layer for Panasonic Viera televisions
//!
//! `viera-api` speaks the protocol; this crate keeps one television's session
//! state, polls it and turns host state changes into commands.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use viera_sdk::{DeviceController, MemorySink, PollingTask, VieraConfig};
//!
//! # async fn demo() -> Result<(), viera_sdk::SdkError> {
//! let config = VieraConfig::from_json(r#"{"ip": "192.168.1.20"}"#)?;
//! let sink = Arc::new(MemorySink::new());
//! let controller = Arc::new(DeviceController::from_config(&config, sink.clone())?);
//!
//! let polling = PollingTask::start(controller.clone(), config.poll_interval());
//! controller
//!     .handle_state_change("viera.0.basic.volume", &serde_json::json!(20), false)
//!     .await?;
//! polling.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod logging;
pub mod polling;
pub mod probe;
pub mod session;
pub mod sink;

pub use config::{ConfigError, VieraConfig};
pub use controller::{DeviceController, ProbeOutcome, StatusReport};
pub use error::{Result, SdkError};
pub use host::HostCommand;
pub use logging::{init_logging, init_logging_from_env, LoggingMode};
pub use polling::{PollingTask, DEFAULT_POLL_INTERVAL};
pub use probe::{ProbeResult, Prober, TcpProber};
pub use session::{SessionEvent, SessionPhase, SessionState};
pub use sink::{MemorySink, StateSink, StateUpdate, StateValue};

pub use viera_api;
