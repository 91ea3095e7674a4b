//! Rotation tests against a mocked history backend.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use std::time::Duration;
use tubelens::rotation::{RotationController, RotationSettings, RotationState, WordRotation};
use tubelens_core::{WordSource, static_words};
use tubelens_sdk::{HistoryClient, KEYWORDS_PATH};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn keywords_body() -> serde_json::Value {
    serde_json::json!({
        "keywords": [
            {"keyword": "Backpropagation", "analysisId": "an_1", "videoTitle": "Neural nets"},
            {"keyword": "Overfitting", "analysisId": "an_2", "shortDefinition": "Memorized noise"},
            {"keyword": "Regularization", "analysisId": "an_3"}
        ]
    })
}

#[tokio::test]
async fn test_history_cached_across_refreshes() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(KEYWORDS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(keywords_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HistoryClient::new(mock_server.uri()).with_token("tok");
    let mut rotation = WordRotation::new(client, RotationSettings::default()).with_seed(11);

    let first = rotation.refresh().await.unwrap();
    let second = rotation.refresh().await.unwrap();

    assert_eq!(first.source, WordSource::History);
    assert_eq!(second.source, WordSource::History);
    assert_ne!(first.term, second.term);
    assert_eq!(rotation.fetch_count(), 1);
    assert_eq!(rotation.state(), RotationState::Displaying);
}

#[tokio::test]
async fn test_slow_backend_falls_back_to_static() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(KEYWORDS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(keywords_body())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let client = HistoryClient::new(mock_server.uri())
        .with_token("tok")
        .with_timeout(Duration::from_millis(50));
    let mut rotation = WordRotation::new(client, RotationSettings::default()).with_seed(3);

    let word = rotation.refresh().await.unwrap();

    assert_eq!(word.source, WordSource::Local);
    assert!(!word.is_clickable());
    assert!(static_words().iter().any(|w| w.term == word.term));
}

#[tokio::test]
async fn test_server_error_is_not_cached() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(KEYWORDS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = HistoryClient::new(mock_server.uri()).with_token("tok");
    let mut rotation = WordRotation::new(client, RotationSettings::default());

    assert_eq!(rotation.refresh().await.unwrap().source, WordSource::Local);
    assert_eq!(rotation.refresh().await.unwrap().source, WordSource::Local);
    assert_eq!(rotation.fetch_count(), 2);
}

#[tokio::test]
async fn test_controller_refresh_publishes_history_word() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(KEYWORDS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(keywords_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HistoryClient::new(mock_server.uri()).with_token("tok");
    let mut controller = RotationController::new(WordRotation::new(client, RotationSettings::default()));
    let mut rx = controller.subscribe();

    controller.mount();
    rx.changed().await.unwrap();
    let published = rx.borrow_and_update().clone().unwrap();

    assert_eq!(published.source, WordSource::History);
    assert!(published.record_id.is_some());
    controller.unmount();
    assert!(!controller.is_mounted());
}
