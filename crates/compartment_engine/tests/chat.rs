use std::time::Duration;

use compartment_engine::{ChatClient, ChatReply, ClientSettings, FailureKind};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn ask_posts_question_and_returns_reply() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/get-response"))
        .and(body_json(json!({ "question": "What is LEV?", "userId": "user-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Levetiracetam.",
            "sources": ["page 2", null]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new(ClientSettings::with_base_url(server.uri())).unwrap();
    let reply = client.ask("What is LEV?", "user-1").await.unwrap();
    assert_eq!(
        reply,
        ChatReply {
            response: "Levetiracetam.".to_string(),
            sources: vec![Some("page 2".to_string()), None],
        }
    );
}

#[tokio::test]
async fn blank_question_is_rejected_locally() {
    engine_logging::initialize_for_tests();
    let client = ChatClient::new(ClientSettings::default()).unwrap();
    let err = client.ask("   ", "user-1").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Validation);
}

#[tokio::test]
async fn chat_maps_rate_limit_and_timeout() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/get-response"))
        .and(body_json(json!({ "question": "busy?", "userId": "u" })))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/get-response"))
        .and(body_json(json!({ "question": "slow?", "userId": "u" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "late", "sources": [] }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let settings = ClientSettings {
        chat_timeout: Duration::from_millis(50),
        ..ClientSettings::with_base_url(server.uri())
    };
    let client = ChatClient::new(settings).unwrap();
    assert_eq!(
        client.ask("busy?", "u").await.unwrap_err().kind,
        FailureKind::RateLimited
    );
    assert_eq!(
        client.ask("slow?", "u").await.unwrap_err().kind,
        FailureKind::Timeout
    );
}
