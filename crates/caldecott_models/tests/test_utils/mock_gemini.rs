//! Mock Gemini client for deterministic driver tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use caldecott_core::{GenerateRequest, GenerateResponse, Output};
use caldecott_error::{CaldecottResult, GeminiError, GeminiErrorKind};
use caldecott_interface::{ArtDriver, Illustrate, IllustrateRequest, Metadata, ModelMetadata};

/// A scripted reply from the mock.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Text output.
    Success(String),
    /// PNG image output with the given bytes.
    Illustration(Vec<u8>),
    /// An error of the given kind.
    Error(GeminiErrorKind),
}

/// How the mock answers consecutive calls.
#[derive(Debug)]
pub enum MockBehavior {
    /// Same reply every time.
    Always(MockResponse),
    /// Fail `failures` times with `error`, then return `text`.
    FailThenSucceed {
        failures: usize,
        error: GeminiErrorKind,
        text: String,
    },
    /// Play the scripted replies in order; panics when exhausted.
    Sequence(Vec<MockResponse>),
}

/// Deterministic stand-in for the real Gemini client.
///
/// Implements the same driver traits so orchestration code under test cannot
/// tell it from the real thing. Every call is counted, which lets tests assert
/// retry and pacing behavior.
pub struct MockGeminiClient {
    behavior: MockBehavior,
    calls: AtomicUsize,
}

impl MockGeminiClient {
    /// Mock that always returns the given text.
    pub fn new_success(text: impl Into<String>) -> Self {
        Self {
            behavior: MockBehavior::Always(MockResponse::Success(text.into())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Mock that always returns a PNG image with the given bytes.
    pub fn new_illustration(data: Vec<u8>) -> Self {
        Self {
            behavior: MockBehavior::Always(MockResponse::Illustration(data)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Mock that always fails with the given error kind.
    pub fn new_error(kind: GeminiErrorKind) -> Self {
        Self {
            behavior: MockBehavior::Always(MockResponse::Error(kind)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Mock that fails `failures` times, then succeeds with `text`.
    pub fn new_fail_then_succeed(
        failures: usize,
        error: GeminiErrorKind,
        text: impl Into<String>,
    ) -> Self {
        Self {
            behavior: MockBehavior::FailThenSucceed {
                failures,
                error,
                text: text.into(),
            },
            calls: AtomicUsize::new(0),
        }
    }

    /// Mock that plays the given replies in order.
    pub fn new_sequence(responses: Vec<MockResponse>) -> Self {
        Self {
            behavior: MockBehavior::Sequence(responses),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of calls made so far (generate and illustrate combined).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> MockResponse {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockBehavior::Always(response) => response.clone(),
            MockBehavior::FailThenSucceed {
                failures,
                error,
                text,
            } => {
                if call < *failures {
                    MockResponse::Error(error.clone())
                } else {
                    MockResponse::Success(text.clone())
                }
            }
            MockBehavior::Sequence(responses) => responses
                .get(call)
                .cloned()
                .unwrap_or_else(|| panic!("mock sequence exhausted after {} calls", call)),
        }
    }

    fn resolve(&self) -> CaldecottResult<GenerateResponse> {
        match self.next_response() {
            MockResponse::Success(text) => Ok(GenerateResponse {
                outputs: vec![Output::Text(text)],
            }),
            MockResponse::Illustration(data) => Ok(GenerateResponse {
                outputs: vec![Output::Image {
                    mime: Some("image/png".to_string()),
                    data,
                }],
            }),
            MockResponse::Error(kind) => Err(GeminiError::new(kind).into()),
        }
    }
}

#[async_trait]
impl ArtDriver for MockGeminiClient {
    async fn generate(&self, _req: &GenerateRequest) -> CaldecottResult<GenerateResponse> {
        self.resolve()
    }

    fn provider_name(&self) -> &'static str {
        "mock-gemini"
    }

    fn model_name(&self) -> &str {
        "mock-gemini"
    }
}

#[async_trait]
impl Illustrate for MockGeminiClient {
    async fn illustrate(&self, _req: &IllustrateRequest) -> CaldecottResult<GenerateResponse> {
        self.resolve()
    }
}

impl Metadata for MockGeminiClient {
    fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            provider: "mock-gemini",
            model: "mock-gemini".to_string(),
            max_input_tokens: 1_048_576,
            max_output_tokens: 8192,
            supports_vision: true,
            supports_illustration: true,
        }
    }
}
