//! Encrypted session tests against a mock television that requires pairing

mod helpers;

use helpers::{MockTv, SESSION_ID};
use viera_api::{ApiError, VieraClient, VieraKey};

const KEY: &str = "AAECAwQFBgcICQoLDA0ODw==";
const APP_ID: &str = "viera-test-app";

#[tokio::test]
async fn test_first_command_performs_handshake() {
    let tv = MockTv::start_encrypted(KEY).await;
    let client = VieraClient::new(tv.endpoint().with_credentials(APP_ID, KEY)).unwrap();
    assert!(!client.has_session().await);

    client.send_key(VieraKey::Up).await.unwrap();

    assert_eq!(tv.handshakes(), 1);
    assert!(client.has_session().await);

    let actions: Vec<String> = tv.requests().into_iter().map(|r| r.soap_action).collect();
    assert_eq!(
        actions,
        vec![
            "\"urn:panasonic-com:service:p00NetworkControl:1#X_GetEncryptSessionId\"".to_string(),
            "\"urn:panasonic-com:service:p00NetworkControl:1#X_EncryptedCommand\"".to_string(),
        ]
    );

    // The key press itself never travels in the clear
    let wire = &tv.requests()[1].body;
    assert!(wire.contains(&format!("<X_ApplicationId>{}</X_ApplicationId>", APP_ID)));
    assert!(!wire.contains("NRC_UP-ONOFF"));
}

#[tokio::test]
async fn test_wrapped_command_carries_session_and_sequence() {
    let tv = MockTv::start_encrypted(KEY).await;
    let client = VieraClient::connect(tv.endpoint().with_credentials(APP_ID, KEY))
        .await
        .unwrap();

    client.send_key(VieraKey::Power).await.unwrap();
    client.send_key(VieraKey::Mute).await.unwrap();

    let commands = tv.decrypted_commands();
    assert_eq!(commands.len(), 2);
    assert!(commands[0].contains(&format!("<X_SessionId>{}</X_SessionId>", SESSION_ID)));
    assert!(commands[0].contains("<X_SequenceNumber>00000011</X_SequenceNumber>"));
    assert!(commands[0].contains(
        "<X_OriginalCommand><u:X_SendKey xmlns:u=\"urn:panasonic-com:service:p00NetworkControl:1\"><X_KeyEvent>NRC_POWER-ONOFF</X_KeyEvent></u:X_SendKey></X_OriginalCommand>"
    ));
    assert!(commands[1].contains("<X_SequenceNumber>00000012</X_SequenceNumber>"));
    assert_eq!(tv.handshakes(), 1);
}

#[tokio::test]
async fn test_rejected_command_renews_session() {
    let tv = MockTv::start_encrypted(KEY).await;
    let client = VieraClient::connect(tv.endpoint().with_credentials(APP_ID, KEY))
        .await
        .unwrap();

    tv.reject_encrypted(1);
    let err = client.send_key(VieraKey::Up).await.unwrap_err();
    assert!(matches!(err, ApiError::ProtocolError(_)), "{:?}", err);
    assert!(!client.has_session().await);

    client.send_key(VieraKey::Up).await.unwrap();
    assert_eq!(tv.handshakes(), 2);
}

#[tokio::test]
async fn test_render_commands_bypass_the_session() {
    let tv = MockTv::start_encrypted(KEY).await;
    let client = VieraClient::new(tv.endpoint().with_credentials(APP_ID, KEY)).unwrap();

    client.set_volume(30).await.unwrap();
    assert_eq!(client.get_volume().await.unwrap(), 30);

    assert_eq!(tv.handshakes(), 0);
    assert!(!client.has_session().await);
}

#[tokio::test]
async fn test_wrong_key_fails_authentication() {
    let tv = MockTv::start_encrypted(KEY).await;
    let endpoint = tv
        .endpoint()
        .with_credentials(APP_ID, "EBESExQVFhcYGRobHB0eHw==");

    let err = VieraClient::connect(endpoint).await.unwrap_err();
    assert!(matches!(err, ApiError::AuthenticationFailed(_)), "{:?}", err);
    assert_eq!(tv.handshakes(), 0);
}

#[tokio::test]
async fn test_establish_session_replaces_existing_session() {
    let tv = MockTv::start_encrypted(KEY).await;
    let client = VieraClient::connect(tv.endpoint().with_credentials(APP_ID, KEY))
        .await
        .unwrap();

    client.establish_session().await.unwrap();
    assert_eq!(tv.handshakes(), 2);
    assert!(client.has_session().await);
}
