//! Test helpers: a scripted Viera television on a local TCP port
//!
//! The mock keeps volume and mute state, answers by `SOAPACTION`, closes every
//! connection after one response and counts overlapping requests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use viera_api::{DeviceEndpoint, SessionKeys};

/// Session id handed out by the encrypted mock
pub const SESSION_ID: &str = "4242";
/// Sequence number handed out with [`SESSION_ID`]
pub const SESSION_SEQ_NUM: u32 = 10;

/// One request as seen by the mock television
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub soap_action: String,
    pub content_type: String,
    pub content_length: usize,
    pub body: String,
}

#[derive(Debug, Default)]
struct TvState {
    volume: u8,
    mute: bool,
    requests: Vec<RecordedRequest>,
    in_flight: usize,
    max_in_flight: usize,
    keys: Option<SessionKeys>,
    handshakes: usize,
    reject_encrypted: usize,
    decrypted: Vec<String>,
}

/// A mock television bound to 127.0.0.1
pub struct MockTv {
    addr: SocketAddr,
    state: Arc<Mutex<TvState>>,
    handle: JoinHandle<()>,
}

impl MockTv {
    pub async fn start() -> Self {
        Self::start_with_delay(Duration::ZERO).await
    }

    /// Start a mock that holds every response for `delay`
    pub async fn start_with_delay(delay: Duration) -> Self {
        Self::spawn(TvState::default(), delay).await
    }

    /// Start a mock that requires encrypted sessions keyed by `encryption_key`
    pub async fn start_encrypted(encryption_key: &str) -> Self {
        let state = TvState {
            keys: Some(SessionKeys::derive(encryption_key).unwrap()),
            ..TvState::default()
        };
        Self::spawn(state, Duration::ZERO).await
    }

    /// Start a plain mock on a port chosen earlier, e.g. by [`refused_endpoint`]
    pub async fn start_on(port: u16) -> Self {
        Self::spawn_on(port, TvState::default(), Duration::ZERO).await
    }

    async fn spawn(state: TvState, delay: Duration) -> Self {
        Self::spawn_on(0, state, delay).await
    }

    async fn spawn_on(port: u16, state: TvState, delay: Duration) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(state));

        let shared = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let state = Arc::clone(&shared);
                tokio::spawn(async move {
                    handle_connection(stream, state, delay).await;
                });
            }
        });

        Self { addr, state, handle }
    }

    pub fn endpoint(&self) -> DeviceEndpoint {
        DeviceEndpoint::new("127.0.0.1")
            .unwrap()
            .with_port(self.addr.port())
    }

    pub fn volume(&self) -> u8 {
        self.state.lock().unwrap().volume
    }

    pub fn set_volume(&self, volume: u8) {
        self.state.lock().unwrap().volume = volume;
    }

    pub fn mute(&self) -> bool {
        self.state.lock().unwrap().mute
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Number of session handshakes served
    pub fn handshakes(&self) -> usize {
        self.state.lock().unwrap().handshakes
    }

    /// Answer the next `count` encrypted commands with a UPnP fault
    pub fn reject_encrypted(&self, count: usize) {
        self.state.lock().unwrap().reject_encrypted = count;
    }

    /// Decrypted `X_EncInfo` payloads of every encrypted command received
    pub fn decrypted_commands(&self) -> Vec<String> {
        self.state.lock().unwrap().decrypted.clone()
    }

    /// Highest number of requests the mock was serving at the same time
    pub fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }
}

impl Drop for MockTv {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start a server that accepts connections and never answers
pub async fn start_silent() -> (DeviceEndpoint, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let endpoint = DeviceEndpoint::new("127.0.0.1").unwrap().with_port(port);
    (endpoint, handle)
}

/// An endpoint on a port nothing listens on
pub async fn refused_endpoint() -> DeviceEndpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    DeviceEndpoint::new("127.0.0.1").unwrap().with_port(port)
}

async fn handle_connection(mut stream: TcpStream, state: Arc<Mutex<TvState>>, delay: Duration) {
    let Some(request) = read_request(&mut stream).await else {
        return;
    };

    {
        let mut state = state.lock().unwrap();
        state.in_flight += 1;
        state.max_in_flight = state.max_in_flight.max(state.in_flight);
    }

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let (status, body) = {
        let mut state = state.lock().unwrap();
        let reply = respond(&mut state, &request);
        state.requests.push(request);
        state.in_flight -= 1;
        reply
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/xml; charset=\"utf-8\"\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut raw = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        raw.extend_from_slice(&chunk[..n]);
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&raw[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let path = lines.next()?.split_whitespace().nth(1)?.to_string();

    let mut soap_action = String::new();
    let mut content_type = String::new();
    let mut content_length = 0;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "soapaction" => soap_action = value.to_string(),
            "content-type" => content_type = value.to_string(),
            "content-length" => content_length = value.parse().unwrap_or(0),
            _ => {}
        }
    }

    while raw.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&raw[header_end..]).into_owned();
    Some(RecordedRequest {
        path,
        soap_action,
        content_type,
        content_length,
        body,
    })
}

fn respond(state: &mut TvState, request: &RecordedRequest) -> (&'static str, String) {
    let action = request
        .soap_action
        .trim_matches('"')
        .rsplit('#')
        .next()
        .unwrap_or_default()
        .to_string();

    match action.as_str() {
        "GetVolume" => ok(
            &action,
            &format!("<CurrentVolume>{}</CurrentVolume>", state.volume),
        ),
        "SetVolume" => match field(&request.body, "DesiredVolume").and_then(|v| v.parse().ok()) {
            Some(volume) => {
                state.volume = volume;
                ok(&action, "")
            }
            None => fault(402),
        },
        "GetMute" => ok(
            &action,
            &format!("<CurrentMute>{}</CurrentMute>", state.mute as u8),
        ),
        "SetMute" => match field(&request.body, "DesiredMute") {
            Some("1") => {
                state.mute = true;
                ok(&action, "")
            }
            Some("0") => {
                state.mute = false;
                ok(&action, "")
            }
            _ => fault(402),
        },
        "X_SendKey" => ok(&action, ""),
        "X_GetEncryptSessionId" => {
            let Some(keys) = state.keys.as_ref() else {
                return fault(401);
            };
            let app_id = field(&request.body, "X_EncInfo")
                .and_then(|info| keys.decrypt(info).ok())
                .filter(|plain| plain.contains("<X_ApplicationId>"));
            if app_id.is_none() {
                return fault(403);
            }
            let result = keys
                .encrypt(&format!(
                    "<X_SessionId>{}</X_SessionId><X_SessionSeqNum>{}</X_SessionSeqNum>",
                    SESSION_ID, SESSION_SEQ_NUM
                ))
                .unwrap();
            state.handshakes += 1;
            ok(&action, &format!("<X_EncResult>{}</X_EncResult>", result))
        }
        "X_EncryptedCommand" => {
            if state.reject_encrypted > 0 {
                state.reject_encrypted -= 1;
                return fault(403);
            }
            let Some(keys) = state.keys.clone() else {
                return fault(401);
            };
            let Some(plain) = field(&request.body, "X_EncInfo").and_then(|info| keys.decrypt(info).ok()) else {
                return fault(403);
            };
            let inner = plain
                .split("<u:")
                .nth(1)
                .and_then(|rest| rest.split_whitespace().next())
                .unwrap_or_default()
                .to_string();
            state.decrypted.push(plain);
            let result = keys.encrypt(&format!("<u:{}Response/>", inner)).unwrap();
            ok(&action, &format!("<X_EncResult>{}</X_EncResult>", result))
        }
        _ => fault(401),
    }
}

fn field<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = start + xml[start..].find(&close)?;
    Some(&xml[start..end])
}

fn ok(action: &str, inner: &str) -> (&'static str, String) {
    (
        "200 OK",
        format!(
            r#"<?xml version="1.0"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:{action}Response xmlns:u="urn:mock">{inner}</u:{action}Response></s:Body></s:Envelope>"#,
            action = action,
            inner = inner
        ),
    )
}

fn fault(code: u16) -> (&'static str, String) {
    (
        "500 Internal Server Error",
        format!(
            r#"<?xml version="1.0"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>{}</errorCode></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#,
            code
        ),
    )
}
