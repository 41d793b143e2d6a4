//! Tests using MockGeminiClient.
//!
//! These tests validate driver trait behavior without making real API calls,
//! using a mock implementation for fast, deterministic testing.

mod test_utils;

use caldecott_error::GeminiErrorKind;
use caldecott_interface::{ArtDriver, Illustrate, IllustrateRequestBuilder, Metadata};
use test_utils::{MockGeminiClient, MockResponse, user_request};

#[tokio::test]
async fn mock_generates_text() {
    let mock = MockGeminiClient::new_success("Hello from mock!");
    let request = user_request("Say hello", Some(10));

    let response = mock.generate(&request).await.unwrap();

    assert_eq!(response.text(), Some("Hello from mock!"));
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn mock_counts_every_request() {
    let mock = MockGeminiClient::new_success("Response");
    let request = user_request("Test", Some(10));

    for expected in 1usize..=3 {
        mock.generate(&request).await.unwrap();
        assert_eq!(mock.call_count(), expected);
    }
}

#[tokio::test]
async fn mock_surfaces_service_overload() {
    let mock = MockGeminiClient::new_error(GeminiErrorKind::HttpError {
        status_code: 503,
        message: "Model is overloaded".to_string(),
    });
    let request = user_request("Test", Some(10));

    assert!(mock.generate(&request).await.is_err());
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn mock_recovers_after_scripted_failures() {
    // Mock fails twice with 503, then succeeds
    let mock = MockGeminiClient::new_fail_then_succeed(
        2,
        GeminiErrorKind::HttpError {
            status_code: 503,
            message: "Service unavailable".to_string(),
        },
        "Success after retries",
    );
    let request = user_request("Test", Some(10));

    assert!(mock.generate(&request).await.is_err());
    assert!(mock.generate(&request).await.is_err());

    let response = mock.generate(&request).await.unwrap();
    assert_eq!(response.text(), Some("Success after retries"));
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test]
async fn mock_surfaces_rate_limit() {
    let mock = MockGeminiClient::new_error(GeminiErrorKind::HttpError {
        status_code: 429,
        message: "Rate limit exceeded".to_string(),
    });
    let request = user_request("Test", Some(10));

    assert!(mock.generate(&request).await.is_err());
}

#[tokio::test]
async fn mock_plays_a_mixed_sequence() {
    let mock = MockGeminiClient::new_sequence(vec![
        MockResponse::Success("First response".to_string()),
        MockResponse::Error(GeminiErrorKind::HttpError {
            status_code: 503,
            message: "Temporary error".to_string(),
        }),
        MockResponse::Success("Third response".to_string()),
    ]);
    let request = user_request("Test", Some(10));

    assert!(mock.generate(&request).await.is_ok());
    assert!(mock.generate(&request).await.is_err());
    assert!(mock.generate(&request).await.is_ok());
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test]
async fn mock_reports_provider_and_model() {
    let mock = MockGeminiClient::new_success("test");

    assert_eq!(mock.provider_name(), "mock-gemini");
    assert_eq!(mock.model_name(), "mock-gemini");
    assert!(mock.metadata().supports_illustration);
}

#[tokio::test]
async fn mock_fails_on_permanent_errors() {
    let request = user_request("Test", Some(10));

    // Authentication error (401)
    let mock_auth = MockGeminiClient::new_error(GeminiErrorKind::HttpError {
        status_code: 401,
        message: "Invalid API key".to_string(),
    });
    assert!(mock_auth.generate(&request).await.is_err());

    // Bad request error (400)
    let mock_bad_request = MockGeminiClient::new_error(GeminiErrorKind::HttpError {
        status_code: 400,
        message: "Invalid request format".to_string(),
    });
    assert!(mock_bad_request.generate(&request).await.is_err());
}

#[tokio::test]
async fn mock_illustrates_with_image_output() {
    let mock = MockGeminiClient::new_illustration(vec![137, 80, 78, 71]);
    let request = IllustrateRequestBuilder::default()
        .prompt("A fox crossing a bridge")
        .build()
        .unwrap();

    let response = mock.illustrate(&request).await.unwrap();

    let (mime, data) = response.image().unwrap();
    assert_eq!(mime, Some("image/png"));
    assert_eq!(data, &[137, 80, 78, 71][..]);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn text_only_illustrate_reply_has_no_image() {
    let mock = MockGeminiClient::new_success("I can only describe the scene.");
    let request = IllustrateRequestBuilder::default()
        .prompt("A fox crossing a bridge")
        .build()
        .unwrap();

    let response = mock.illustrate(&request).await.unwrap();

    assert!(response.image().is_none());
    assert_eq!(response.text(), Some("I can only describe the scene."));
}
