//! HTTP transport against a mock replay endpoint

use action_replay::codec::encode;
use action_replay::command::Command;
use action_replay::loader::{load_session, LoadError};
use action_replay::recorder::{BufferConfig, CommandBuffer};
use action_replay::upload::{ActionSource, HttpTransport, TransportError, UploadRequest, Uploader};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_upload_posts_encoded_batch() {
    let server = MockServer::start().await;
    let session_id = Uuid::new_v4();
    let actions = vec![
        encode(&Command::route(1_000, "/feed").to_action()),
        encode(&Command::activate(1_700, "like-post").to_action()),
    ];
    let expected = serde_json::to_value(UploadRequest {
        session_id,
        actions: actions.clone(),
    })
    .unwrap();
    assert_eq!(expected["actions"][0]["t"], "r");
    assert_eq!(expected["actions"][0]["d"]["p"], "/feed");

    Mock::given(method("POST"))
        .and(path("/api/replay"))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri());
    transport.upload(session_id, &actions).await.unwrap();
}

#[tokio::test]
async fn test_fetch_returns_actions_in_order() {
    let server = MockServer::start().await;
    let session_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/api/replay/{session_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "actions": [
                { "t": "r", "ts": 1000, "d": { "p": "/feed" } },
                { "t": "c", "ts": 1700, "d": { "s": "like-post" } },
                { "t": "scroll", "ts": 2200, "d": { "scrollY": 0.4, "scrollX": 0.0 } }
            ]
        })))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(format!("{}/", server.uri()));
    let fetched = transport.fetch(session_id).await.unwrap();
    assert_eq!(fetched.len(), 3);

    let commands = load_session(&transport, session_id).await.unwrap();
    assert_eq!(
        commands,
        vec![
            Command::route(1_000, "/feed"),
            Command::activate(1_700, "like-post"),
            Command::scroll(2_200, 0.4, 0.0),
        ]
    );
}

#[tokio::test]
async fn test_error_statuses_surface() {
    let server = MockServer::start().await;
    let session_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/api/replay"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/replay/{session_id}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri());

    let upload = transport.upload(session_id, &[]).await;
    assert!(matches!(upload, Err(TransportError::Status(401))));

    let load = load_session(&transport, session_id).await;
    assert!(matches!(
        load,
        Err(LoadError::Fetch { source: TransportError::Status(404), .. })
    ));
}

#[tokio::test]
async fn test_buffer_keeps_batch_until_server_accepts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/replay"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/replay"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let buffer = CommandBuffer::new(Arc::new(HttpTransport::new(server.uri())), BufferConfig::default());
    buffer.init();
    buffer.push(Command::route(1_000, "/feed"));
    buffer.push(Command::route(2_000, "/settings"));

    assert!(!buffer.flush().await);
    assert_eq!(buffer.len(), 2);

    assert!(buffer.flush().await);
    assert!(buffer.is_empty());
}
