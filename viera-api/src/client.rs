use std::sync::Arc;
use std::time::Duration;

use soap_client::SoapClient;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::command::{encode_operation, Command, EncodedRequest};
use crate::crypto::SessionKeys;
use crate::endpoint::DeviceEndpoint;
use crate::error::{ApiError, Result};
use crate::keys::KeyCode;
use crate::operation::{RetryPolicy, VieraOperation};
use crate::operations::network_control::{
    EncryptedCommandOperation, EncryptedCommandOperationRequest, GetEncryptSessionIdOperation,
    GetEncryptSessionIdOperationRequest, SendKeyOperation, SendKeyOperationRequest,
};
use crate::operations::rendering_control::{
    GetMuteOperation, GetMuteOperationRequest, GetVolumeOperation, GetVolumeOperationRequest,
    SetMuteOperation, SetMuteOperationRequest, SetVolumeOperation, SetVolumeOperationRequest,
};
use crate::response::extract_field;
use crate::service::Service;

/// Result of executing a [`Command`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutput {
    /// The command carries no value (key press, set)
    Done,
    Volume(u8),
    Mute(bool),
}

#[derive(Debug)]
struct SessionContext {
    keys: Option<SessionKeys>,
    session: Option<EncryptedSession>,
}

#[derive(Debug)]
struct EncryptedSession {
    id: String,
    seq_num: u32,
}

/// A client for one Viera television
///
/// Every round trip, including the session handshake that may precede it,
/// runs under a per-device lock, so requests against one TV never overlap.
/// Clones share that lock and the encrypted session.
///
/// Without credentials the client talks plain SOAP. With credentials it opens an
/// encrypted session before the first NetworkControl command and wraps every
/// such command; a handshake failure is returned as
/// [`ApiError::AuthenticationFailed`] and nothing is sent in the clear instead.
///
/// # Example
/// ```rust,no_run
/// use viera_api::{DeviceEndpoint, VieraClient, VieraKey};
///
/// # async fn demo() -> viera_api::Result<()> {
/// let client = VieraClient::connect(DeviceEndpoint::new("192.168.1.20")?).await?;
/// client.send_key(VieraKey::VolumeUp).await?;
/// let volume = client.get_volume().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct VieraClient {
    endpoint: DeviceEndpoint,
    soap: SoapClient,
    session: Arc<Mutex<SessionContext>>,
    read_retry: RetryPolicy,
}

impl VieraClient {
    /// Create a client with the default 5 second request timeout
    ///
    /// No network traffic happens here; see [`VieraClient::connect`].
    pub fn new(endpoint: DeviceEndpoint) -> Result<Self> {
        Self::with_timeout(endpoint, soap_client::DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(endpoint: DeviceEndpoint, timeout: Duration) -> Result<Self> {
        Self::with_soap_client(endpoint, SoapClient::with_timeout(timeout)?)
    }

    /// Create a client around an existing SOAP client
    pub fn with_soap_client(endpoint: DeviceEndpoint, soap: SoapClient) -> Result<Self> {
        let keys = endpoint
            .credentials()
            .map(|c| SessionKeys::derive(&c.encryption_key))
            .transpose()?;

        Ok(Self {
            endpoint,
            soap,
            session: Arc::new(Mutex::new(SessionContext { keys, session: None })),
            read_retry: RetryPolicy::none(),
        })
    }

    /// Retry policy for the read-only queries (`get_volume`, `get_mute`)
    pub fn with_read_retry(mut self, policy: RetryPolicy) -> Self {
        self.read_retry = policy;
        self
    }

    /// Create a client and, when credentials are present, open the encrypted session
    pub async fn connect(endpoint: DeviceEndpoint) -> Result<Self> {
        let client = Self::new(endpoint)?;
        client.establish_session().await?;
        Ok(client)
    }

    /// [`VieraClient::connect`] with a custom request timeout
    pub async fn connect_with_timeout(endpoint: DeviceEndpoint, timeout: Duration) -> Result<Self> {
        let client = Self::with_timeout(endpoint, timeout)?;
        client.establish_session().await?;
        Ok(client)
    }

    /// Run the session handshake now, replacing any existing session
    ///
    /// Does nothing for clients without credentials.
    pub async fn establish_session(&self) -> Result<()> {
        if !self.is_encrypted() {
            return Ok(());
        }
        let mut ctx = self.session.lock().await;
        ctx.session = None;
        self.handshake(&mut ctx).await
    }

    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    /// Whether this client uses encrypted sessions
    pub fn is_encrypted(&self) -> bool {
        self.endpoint.credentials().is_some()
    }

    /// Whether an encrypted session is currently established
    pub async fn has_session(&self) -> bool {
        self.session.lock().await.session.is_some()
    }

    /// Execute a logical command
    ///
    /// Queries use the client's read retry policy; everything else is sent once.
    pub async fn execute(&self, command: &Command) -> Result<CommandOutput> {
        if command.is_idempotent() {
            let policy = self.read_retry.clone();
            self.execute_with_retry(command, &policy).await
        } else {
            self.execute_with_retry(command, &RetryPolicy::none()).await
        }
    }

    /// Execute a command retrying transport failures under `policy`
    ///
    /// This is the opt-in for retrying commands that are not idempotent.
    pub async fn execute_with_retry(&self, command: &Command, policy: &RetryPolicy) -> Result<CommandOutput> {
        match command {
            Command::Key(key) => self
                .run::<SendKeyOperation>(&SendKeyOperationRequest { key: key.clone() }, policy)
                .await
                .map(|_| CommandOutput::Done),
            Command::GetVolume => self
                .run::<GetVolumeOperation>(&GetVolumeOperationRequest {}, policy)
                .await
                .map(CommandOutput::Volume),
            Command::SetVolume(volume) => self
                .run::<SetVolumeOperation>(&SetVolumeOperationRequest { desired_volume: *volume }, policy)
                .await
                .map(|_| CommandOutput::Done),
            Command::GetMute => self
                .run::<GetMuteOperation>(&GetMuteOperationRequest {}, policy)
                .await
                .map(CommandOutput::Mute),
            Command::SetMute(mute) => self
                .run::<SetMuteOperation>(&SetMuteOperationRequest { desired_mute: *mute }, policy)
                .await
                .map(|_| CommandOutput::Done),
        }
    }

    /// Press a remote-control button
    pub async fn send_key(&self, key: impl Into<KeyCode>) -> Result<()> {
        let request = SendKeyOperationRequest { key: key.into() };
        self.run::<SendKeyOperation>(&request, &RetryPolicy::none()).await
    }

    pub async fn get_volume(&self) -> Result<u8> {
        self.run::<GetVolumeOperation>(&GetVolumeOperationRequest {}, &self.read_retry)
            .await
    }

    /// Set the volume; fails with `InvalidArgument` outside 0..=100 without sending anything
    ///
    /// The new value is not read back; call [`VieraClient::get_volume`] to confirm.
    pub async fn set_volume(&self, volume: i64) -> Result<()> {
        let request = SetVolumeOperationRequest { desired_volume: volume };
        self.run::<SetVolumeOperation>(&request, &RetryPolicy::none()).await
    }

    pub async fn get_mute(&self) -> Result<bool> {
        self.run::<GetMuteOperation>(&GetMuteOperationRequest {}, &self.read_retry)
            .await
    }

    /// Set the mute state; not read back
    pub async fn set_mute(&self, mute: bool) -> Result<()> {
        let request = SetMuteOperationRequest { desired_mute: mute };
        self.run::<SetMuteOperation>(&request, &RetryPolicy::none()).await
    }

    /// Execute a typed operation
    pub async fn run<Op: VieraOperation>(&self, request: &Op::Request, policy: &RetryPolicy) -> Result<Op::Response> {
        let encoded = encode_operation::<Op>(request)?;
        let service = Op::SERVICE.name();
        let mut retry = 0;

        loop {
            let error = match self.round_trip(&encoded).await {
                Ok(body) => return Op::parse_response(&body),
                Err(e) => e,
            };

            retry += 1;
            match policy.delay_before(retry) {
                Some(delay) if error.is_transport() => {
                    warn!(service, action = Op::ACTION, retry, error = %error, "retrying after transport failure");
                    tokio::time::sleep(delay).await;
                }
                _ => {
                    debug!(service, action = Op::ACTION, error = %error, "request failed");
                    return Err(error);
                }
            }
        }
    }

    async fn round_trip(&self, request: &EncodedRequest) -> Result<String> {
        let mut ctx = self.session.lock().await;

        if ctx.keys.is_some() && request.service == Service::NetworkControl {
            return self.send_encrypted(&mut ctx, request).await;
        }

        Ok(self
            .soap
            .post(
                &self.endpoint.host(),
                request.path,
                &request.soap_action,
                request.body.clone(),
            )
            .await?)
    }

    async fn send_encrypted(&self, ctx: &mut SessionContext, request: &EncodedRequest) -> Result<String> {
        if ctx.session.is_none() {
            self.handshake(ctx).await?;
        }

        let enc_info = {
            let SessionContext { keys, session } = &mut *ctx;
            let (Some(keys), Some(session)) = (keys.as_ref(), session.as_mut()) else {
                return Err(ApiError::AuthenticationFailed("no encrypted session".to_string()));
            };
            session.seq_num = session.seq_num.wrapping_add(1);
            let original = format!(
                "<X_SessionId>{}</X_SessionId><X_SequenceNumber>{:08}</X_SequenceNumber><X_OriginalCommand><u:{action} xmlns:u=\"urn:{urn}\">{fragment}</u:{action}></X_OriginalCommand>",
                session.id,
                session.seq_num % 100_000_000,
                action = request.action,
                urn = request.urn,
                fragment = request.fragment,
            );
            keys.encrypt(&original)?
        };

        let wrapped = encode_operation::<EncryptedCommandOperation>(&EncryptedCommandOperationRequest {
            application_id: self.app_id()?.to_string(),
            enc_info,
        })?;

        let text = match self
            .soap
            .post(&self.endpoint.host(), wrapped.path, &wrapped.soap_action, wrapped.body)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                if !e.is_transport() {
                    warn!(action = request.action, error = %e, "encrypted command rejected, session will be renewed");
                    ctx.session = None;
                }
                return Err(e.into());
            }
        };

        match (EncryptedCommandOperation::parse_response(&text)?, ctx.keys.as_ref()) {
            (Some(result), Some(keys)) => keys.decrypt(&result),
            _ => Ok(text),
        }
    }

    async fn handshake(&self, ctx: &mut SessionContext) -> Result<()> {
        let app_id = self.app_id()?;
        let keys = ctx
            .keys
            .as_ref()
            .ok_or_else(|| ApiError::AuthenticationFailed("no encryption key configured".to_string()))?;

        let enc_info = keys
            .encrypt(&format!("<X_ApplicationId>{}</X_ApplicationId>", app_id))
            .map_err(auth_failure)?;
        let request = encode_operation::<GetEncryptSessionIdOperation>(&GetEncryptSessionIdOperationRequest {
            application_id: app_id.to_string(),
            enc_info,
        })
        .map_err(auth_failure)?;

        debug!(host = %self.endpoint.host(), "requesting encrypted session");
        let text = self
            .soap
            .post(&self.endpoint.host(), request.path, &request.soap_action, request.body)
            .await
            .map_err(|e| auth_failure(e.into()))?;

        let enc_result = GetEncryptSessionIdOperation::parse_response(&text).map_err(auth_failure)?;
        let decrypted = keys.decrypt(&enc_result).map_err(auth_failure)?;

        let id = extract_field(&decrypted, "X_SessionId")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::AuthenticationFailed("session response lacks X_SessionId".to_string()))?
            .to_string();
        let seq_num = extract_field(&decrypted, "X_SessionSeqNum")
            .and_then(|n| n.trim().parse::<u32>().ok())
            .ok_or_else(|| ApiError::AuthenticationFailed("session response lacks X_SessionSeqNum".to_string()))?;

        info!(host = %self.endpoint.host(), "encrypted session established");
        ctx.session = Some(EncryptedSession { id, seq_num });
        Ok(())
    }

    fn app_id(&self) -> Result<&str> {
        self.endpoint
            .credentials()
            .map(|c| c.app_id.as_str())
            .ok_or_else(|| ApiError::AuthenticationFailed("no application id configured".to_string()))
    }
}

/// Classify a handshake failure; an unreachable TV stays a transport error
fn auth_failure(error: ApiError) -> ApiError {
    match error {
        ApiError::TransportError { .. } | ApiError::AuthenticationFailed(_) => error,
        other => ApiError::AuthenticationFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = VieraClient::new(DeviceEndpoint::new("192.168.1.20").unwrap()).unwrap();
        assert!(!client.is_encrypted());
        assert_eq!(client.endpoint().port(), 55000);
    }

    #[test]
    fn test_bad_encryption_key_is_rejected_up_front() {
        let endpoint = DeviceEndpoint::new("192.168.1.20")
            .unwrap()
            .with_credentials("app", "short");
        assert!(matches!(
            VieraClient::new(endpoint),
            Err(ApiError::AuthenticationFailed(_))
        ));
    }

    #[test]
    fn test_auth_failure_keeps_transport_errors() {
        let transport = ApiError::TransportError {
            kind: crate::error::TransportErrorKind::Timeout,
            message: "slow".to_string(),
        };
        assert!(auth_failure(transport).is_transport());

        let protocol = ApiError::ProtocolError("HTTP status 500".to_string());
        assert!(matches!(auth_failure(protocol), ApiError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn test_plain_client_needs_no_session() {
        let client = VieraClient::new(DeviceEndpoint::new("192.168.1.20").unwrap()).unwrap();
        assert!(client.establish_session().await.is_ok());
        assert!(!client.has_session().await);
    }
}
