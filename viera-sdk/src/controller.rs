//! Device controller
//!
//! Owns everything the bridge knows about one television: its client, its
//! session state and where updates are reported.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use viera_api::{ApiError, VieraClient};

use crate::config::VieraConfig;
use crate::error::{Result, SdkError};
use crate::host::HostCommand;
use crate::probe::{Prober, TcpProber};
use crate::session::{SessionEvent, SessionState};
use crate::sink::{keys, StateSink, StateValue};

/// Outcome of the reachability step of a status check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    Alive,
    Unreachable,
    /// Not probed because a command was in flight
    Skipped,
}

/// What one status check found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub probe: ProbeOutcome,
    /// Last `info.tv_on` value reported during this check
    pub tv_on: Option<bool>,
    pub volume: Option<u8>,
    pub mute: Option<bool>,
}

impl StatusReport {
    fn new(probe: ProbeOutcome) -> Self {
        Self {
            probe,
            tv_on: None,
            volume: None,
            mute: None,
        }
    }
}

/// Drives one television: status checks and host commands
pub struct DeviceController {
    client: VieraClient,
    prober: Arc<dyn Prober>,
    sink: Arc<dyn StateSink>,
    state: Mutex<SessionState>,
    reported_connection: Mutex<Option<bool>>,
    in_flight: AtomicUsize,
}

/// Marks a command round trip as outstanding until dropped
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DeviceController {
    pub fn new(client: VieraClient, prober: Arc<dyn Prober>, sink: Arc<dyn StateSink>) -> Self {
        Self {
            client,
            prober,
            sink,
            state: Mutex::new(SessionState::new()),
            reported_connection: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Build a controller from configuration with the default TCP prober
    pub fn from_config(config: &VieraConfig, sink: Arc<dyn StateSink>) -> Result<Self> {
        let endpoint = config.endpoint()?;
        let prober = TcpProber::new().with_port(endpoint.port());
        let client = VieraClient::with_timeout(endpoint, config.request_timeout())?;
        Ok(Self::new(client, Arc::new(prober), sink))
    }

    pub fn client(&self) -> &VieraClient {
        &self.client
    }

    /// Snapshot of the session state
    pub fn state(&self) -> SessionState {
        self.state.lock().clone()
    }

    /// Whether the last probe found the television reachable
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Whether a host command is currently being executed
    pub fn command_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Probe the television and, when reachable, refresh mute and volume
    ///
    /// Failures are logged and reported through the sink; they never escape,
    /// so a polling loop keeps running against a television that is off.
    pub async fn check_status(&self) -> StatusReport {
        if self.command_in_flight() {
            debug!(host = %self.client.endpoint().host(), "command in flight, skipping probe");
            return StatusReport::new(ProbeOutcome::Skipped);
        }

        self.apply(SessionEvent::ProbeStarted);
        let ip = self.client.endpoint().ip();
        let alive = match self.prober.probe(ip).await {
            Ok(result) => result.alive,
            Err(e) => {
                warn!(%ip, error = %e, "probe failed");
                false
            }
        };

        self.apply(if alive {
            SessionEvent::ProbeSucceeded
        } else {
            SessionEvent::ProbeFailed
        });
        self.report_connection(alive);

        if !alive {
            return StatusReport::new(ProbeOutcome::Unreachable);
        }

        let mut report = StatusReport::new(ProbeOutcome::Alive);
        if let Err(e) = self.ensure_session().await {
            warn!(error = %e, "could not open session");
            self.record_failure(&e);
            self.report(keys::TV_ON, false);
            report.tv_on = Some(false);
            return report;
        }

        match self.client.get_mute().await {
            Ok(mute) => {
                self.apply(SessionEvent::MuteObserved(mute));
                self.report(keys::MUTE, mute);
                self.report(keys::TV_ON, true);
                report.mute = Some(mute);
                report.tv_on = Some(true);
            }
            Err(e) => {
                warn!(error = %e, "getMute failed");
                self.record_failure(&e);
                self.report(keys::TV_ON, false);
                report.tv_on = Some(false);
            }
        }

        match self.client.get_volume().await {
            Ok(volume) => {
                self.apply(SessionEvent::VolumeObserved(volume));
                self.report(keys::VOLUME, volume);
                self.report(keys::TV_ON, true);
                report.volume = Some(volume);
                report.tv_on = Some(true);
            }
            Err(e) => {
                warn!(error = %e, "getVolume failed");
                self.record_failure(&e);
                self.report(keys::TV_ON, false);
                report.tv_on = Some(false);
            }
        }

        report
    }

    /// React to a host state change
    ///
    /// Acknowledged values and changes arriving while the television is not
    /// connected are ignored. Returns whether a command was sent.
    pub async fn handle_state_change(&self, id: &str, value: &Value, ack: bool) -> Result<bool> {
        if ack {
            return Ok(false);
        }

        if !self.is_connected() {
            debug!(id, "television not connected, ignoring state change");
            return Ok(false);
        }

        let command = HostCommand::from_state(id, value)?;
        debug!(id, %value, ?command, "state triggered");
        self.dispatch(command).await?;
        Ok(true)
    }

    /// Execute a host command, confirming render commands with a read back
    pub async fn dispatch(&self, command: HostCommand) -> Result<()> {
        let _guard = self.begin_command();

        let result = self.run_command(&command).await;
        if let Err(e) = &result {
            warn!(?command, error = %e, "command failed");
            self.record_failure(e);
        }
        result.map_err(SdkError::from)
    }

    async fn run_command(&self, command: &HostCommand) -> std::result::Result<(), ApiError> {
        self.ensure_session().await?;

        match command {
            HostCommand::Key(code) => {
                self.client.send_key(code.clone()).await?;
                self.apply(SessionEvent::CommandSucceeded);
            }
            HostCommand::SetMute(mute) => {
                self.client.set_mute(*mute).await?;
                let mute = self.client.get_mute().await?;
                self.apply(SessionEvent::MuteObserved(mute));
                self.report(keys::MUTE, mute);
            }
            HostCommand::SetVolume(volume) => {
                self.client.set_volume(*volume).await?;
                self.confirm_volume().await?;
            }
            HostCommand::VolumeStep(key) => {
                self.client.send_key(*key).await?;
                self.confirm_volume().await?;
            }
        }
        Ok(())
    }

    async fn confirm_volume(&self) -> std::result::Result<(), ApiError> {
        let volume = self.client.get_volume().await?;
        self.apply(SessionEvent::VolumeObserved(volume));
        self.report(keys::VOLUME, volume);
        self.report(keys::TV_ON, true);
        Ok(())
    }

    /// Move the session to `Ready`, running the handshake if one is needed
    async fn ensure_session(&self) -> std::result::Result<(), ApiError> {
        if self.state.lock().is_ready() {
            return Ok(());
        }

        self.apply(SessionEvent::ConnectStarted);
        if self.client.is_encrypted() && !self.client.has_session().await {
            self.client.establish_session().await?;
            info!(host = %self.client.endpoint().host(), "session ready");
        }
        self.apply(SessionEvent::Connected);
        Ok(())
    }

    fn begin_command(&self) -> InFlightGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(&self.in_flight)
    }

    fn record_failure(&self, error: &ApiError) {
        match error {
            ApiError::InvalidArgument(_) => {}
            ApiError::AuthenticationFailed(_) => self.apply(SessionEvent::AuthRejected),
            _ => self.apply(SessionEvent::CommandFailed),
        }
    }

    fn apply(&self, event: SessionEvent) {
        self.state.lock().apply(event);
    }

    fn report(&self, key: &str, value: impl Into<StateValue>) {
        self.sink.set_value(key, value.into(), true);
    }

    /// Report connectivity, but only when it changed
    fn report_connection(&self, alive: bool) {
        let mut reported = self.reported_connection.lock();
        if *reported != Some(alive) {
            *reported = Some(alive);
            info!(host = %self.client.endpoint().host(), connected = alive, "connection changed");
            self.report(keys::CONNECTION, alive);
        }
    }
}
